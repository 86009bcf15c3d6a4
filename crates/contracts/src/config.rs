//! DashboardConfig - Config Loader output
//!
//! Describes where records come from, the default query, export routing and
//! the HTTP listener.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{ExportLayout, Granularity, Metric, QueryParams, Scope};

/// Default safety cap on records drained per query
pub const DEFAULT_MAX_RECORDS: usize = 50_000;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete dashboard configuration
///
/// The default runs the mock source with no sinks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DashboardConfig {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Record source settings
    #[validate(nested)]
    pub source: SourceConfig,

    /// Default query parameters
    #[serde(default)]
    pub query: QueryDefaults,

    /// Export settings
    #[serde(default)]
    #[validate(nested)]
    pub export: ExportConfig,

    /// Export sinks
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,

    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,
}

/// Which record source backs the pipeline
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    /// Source kind
    pub kind: SourceKind,

    /// Dataset file (fixture source only)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Records per page requested from the source
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100_000))]
    pub page_size: usize,

    /// Safety cap on records drained per query
    #[serde(default = "default_max_records")]
    #[validate(range(min = 1))]
    pub max_records: usize,

    /// Synthetic data settings (mock source only)
    #[serde(default)]
    #[validate(nested)]
    pub mock: MockSourceConfig,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Mock,
            path: None,
            page_size: default_page_size(),
            max_records: default_max_records(),
            mock: MockSourceConfig::default(),
        }
    }
}

fn default_page_size() -> usize {
    500
}

fn default_max_records() -> usize {
    DEFAULT_MAX_RECORDS
}

/// Source kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// JSON dataset on disk
    Fixture,
    /// Deterministic synthetic data
    Mock,
}

/// Synthetic fleet settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MockSourceConfig {
    /// Number of vehicles
    #[validate(range(min = 1, max = 10_000))]
    pub vehicles: usize,

    /// First generated day
    pub start: NaiveDate,

    /// Number of generated days
    #[validate(range(min = 1, max = 3660))]
    pub days: u32,

    /// Samples per vehicle per day
    #[validate(range(min = 1, max = 96))]
    pub samples_per_day: u32,

    /// Inject a transport failure when this page (1-based) is requested
    pub fail_on_page: Option<usize>,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            vehicles: 5,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            days: 90,
            samples_per_day: 2,
            fail_on_page: None,
        }
    }
}

/// Query parameters with optional dates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryDefaults {
    #[serde(default)]
    pub metric: Metric,

    #[serde(default)]
    pub scope: Scope,

    #[serde(default)]
    pub group_id: Option<String>,

    #[serde(default)]
    pub granularity: Granularity,

    /// Start date; defaults to three months before `to`
    #[serde(default)]
    pub from: Option<NaiveDate>,

    /// End date; defaults to today
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl QueryDefaults {
    /// Resolve into concrete parameters, filling missing dates relative to `today`
    pub fn to_params(&self, today: NaiveDate) -> QueryParams {
        let to = self.to.unwrap_or(today);
        let from = self.from.unwrap_or_else(|| default_from(to));
        QueryParams {
            metric: self.metric,
            scope: self.scope,
            group_id: self.group_id.clone(),
            granularity: self.granularity,
            from,
            to,
        }
    }
}

/// Three months before `to`, clamped to the end of shorter months
pub fn default_from(to: NaiveDate) -> NaiveDate {
    to.checked_sub_months(Months::new(3)).unwrap_or(to)
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExportConfig {
    /// Default layout
    #[serde(default)]
    pub layout: ExportLayout,

    /// File name prefix used by file sinks
    #[serde(default = "default_file_prefix")]
    #[validate(length(min = 1))]
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            layout: ExportLayout::default(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_file_prefix() -> String {
    "fleetview".to_string()
}

/// Sink output config
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink name
    #[validate(length(min = 1))]
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log a summary
    Log,
    /// Write to a directory
    File,
}

/// HTTP listener config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}
