//! Shared server state

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use contracts::{DashboardConfig, QueryDefaults};
use ingestion::{DrainConfig, FixtureSource, Paginator, QueryRunner};

/// State shared by all handlers
///
/// Holds no query results: every request runs its own cycle.
pub struct AppState {
    pub runner: QueryRunner<FixtureSource>,
    pub defaults: QueryDefaults,
    pub file_prefix: String,
}

impl AppState {
    pub fn new(runner: QueryRunner<FixtureSource>, defaults: QueryDefaults) -> Self {
        Self {
            runner,
            defaults,
            file_prefix: "fleetview".to_string(),
        }
    }

    /// Build the source and runner described by a dashboard config
    pub fn from_config(config: &DashboardConfig) -> ingestion::Result<Self> {
        let source = FixtureSource::from_config(&config.source)?;
        let paginator = Paginator::new(DrainConfig::from(&config.source));
        let runner = QueryRunner::new(Arc::new(source), paginator);
        Ok(Self {
            runner,
            defaults: config.query.clone(),
            file_prefix: config.export.file_prefix.clone(),
        })
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Current UTC date, the anchor for default date windows
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}
