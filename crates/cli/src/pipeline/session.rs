//! Query session: config resolution and the runner built from it.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use config_loader::ConfigLoader;
use contracts::{DashboardConfig, GroupInfo, QueryParams, Scope, SourceKind};
use ingestion::{DrainConfig, FixtureSource, Paginator, QueryResult, QueryRunner};
use tracing::{debug, info};

use crate::cli::{QueryOverrides, SourceArgs};
use crate::error::CliError;

/// Load the configuration named by `args`, or the built-in defaults, and
/// apply source overrides
pub fn load_config(args: &SourceArgs) -> Result<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            debug!("No configuration file given, using the mock source");
            DashboardConfig::default()
        }
    };

    if let Some(ref dataset) = args.dataset {
        info!(dataset = %dataset.display(), "Overriding source with dataset from CLI");
        config.source.kind = SourceKind::Fixture;
        config.source.path = Some(dataset.clone());
    }
    if let Some(page_size) = args.source_page_size {
        config.source.page_size = page_size;
    }
    if let Some(max_records) = args.max_records {
        config.source.max_records = max_records;
    }

    ConfigLoader::validate(&config).map_err(CliError::from)?;
    Ok(config)
}

/// Apply query overrides on top of the configured defaults
///
/// A group id implies group scope unless a scope is given explicitly.
pub fn apply_query_overrides(config: &mut DashboardConfig, overrides: &QueryOverrides) {
    let query = &mut config.query;
    if let Some(metric) = overrides.metric {
        query.metric = metric;
    }
    if let Some(ref group) = overrides.group {
        query.group_id = Some(group.clone());
        query.scope = Scope::Group;
    }
    if let Some(scope) = overrides.scope {
        query.scope = scope;
    }
    if let Some(granularity) = overrides.granularity {
        query.granularity = granularity;
    }
    if overrides.from.is_some() {
        query.from = overrides.from;
    }
    if overrides.to.is_some() {
        query.to = overrides.to;
    }
}

/// A configured source plus the runner that queries it
pub struct Session {
    config: DashboardConfig,
    runner: QueryRunner<FixtureSource>,
}

impl Session {
    /// Build the source described by `config`
    pub fn new(config: DashboardConfig) -> Result<Self> {
        let source = FixtureSource::from_config(&config.source).map_err(CliError::from)?;
        let paginator = Paginator::new(DrainConfig::from(&config.source));
        info!(
            kind = ?config.source.kind,
            page_size = config.source.page_size,
            max_records = paginator.max_records(),
            "Source ready"
        );
        let runner = QueryRunner::new(Arc::new(source), paginator);
        Ok(Self { config, runner })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn runner(&self) -> &QueryRunner<FixtureSource> {
        &self.runner
    }

    /// Default query with dates resolved against today (UTC)
    pub fn params(&self) -> QueryParams {
        self.params_at(Utc::now().date_naive())
    }

    pub fn params_at(&self, today: NaiveDate) -> QueryParams {
        self.config.query.to_params(today)
    }

    /// Run one query cycle and report it to the metrics recorder
    pub async fn run(&self, params: &QueryParams) -> std::result::Result<QueryResult, CliError> {
        match self.runner.run_query(params).await {
            Ok(result) => {
                observability::record_query_outcome(&result.stats);
                Ok(result)
            }
            Err(e) => {
                observability::record_query_failure(e.class());
                Err(e.into())
            }
        }
    }

    pub async fn groups(&self) -> std::result::Result<Vec<GroupInfo>, CliError> {
        Ok(self.runner.list_groups().await?)
    }

    /// Hand the runner to the HTTP server
    pub fn into_app_state(self) -> api_server::AppState {
        api_server::AppState::new(self.runner, self.config.query.clone())
            .with_file_prefix(self.config.export.file_prefix.clone())
    }
}
