//! CLI argument definitions using clap.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::{AggregationMode, ExportLayout, Granularity, Metric, Scope};
use std::path::PathBuf;

/// fleetview - Fleet telemetry dashboard pipeline
#[derive(Parser, Debug)]
#[command(
    name = "fleetview",
    author,
    version,
    about = "Fleet telemetry query, pivot and export pipeline",
    long_about = "Queries per-vehicle telemetry (distance, fuel) from a paged record source,\n\
                  joins device names, aggregates into time series and pivot tables, and \n\
                  exports CSV or serves the results over HTTP."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FLEETVIEW_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FLEETVIEW_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (disabled when absent)
    #[arg(long, global = true, env = "FLEETVIEW_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a query and print series, table or pivot
    Query(QueryArgs),

    /// Run a query and export it as CSV
    Export(ExportArgs),

    /// List selectable groups
    Groups(GroupsArgs),

    /// Serve the HTTP API
    Serve(ServeArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Where records come from
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Path to configuration file (TOML or JSON); built-in mock source when absent
    #[arg(short, long, env = "FLEETVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use this JSON dataset instead of the configured source
    #[arg(long, env = "FLEETVIEW_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Override records per page
    #[arg(long, env = "FLEETVIEW_PAGE_SIZE")]
    pub source_page_size: Option<usize>,

    /// Override the record cap per query
    #[arg(long, env = "FLEETVIEW_MAX_RECORDS")]
    pub max_records: Option<usize>,
}

/// Overrides for the configured default query
#[derive(Args, Debug, Clone, Default)]
pub struct QueryOverrides {
    /// Metric: distance | fuel
    #[arg(long)]
    pub metric: Option<Metric>,

    /// Scope: fleet | group
    #[arg(long)]
    pub scope: Option<Scope>,

    /// Group id (implies --scope group)
    #[arg(short, long)]
    pub group: Option<String>,

    /// Granularity: daily | monthly
    #[arg(long)]
    pub granularity: Option<Granularity>,

    /// Start date (YYYY-MM-DD); three months before --to when absent
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// End date (YYYY-MM-DD); today when absent
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

/// Arguments for the `query` command
#[derive(Parser, Debug, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub query: QueryOverrides,

    /// What to print
    #[arg(long, value_enum, default_value = "series")]
    pub view: View,

    /// Aggregation mode for series: sum | average
    #[arg(long, default_value = "sum")]
    pub mode: AggregationMode,

    /// Vehicle for the overlay series, as `name|serial` (repeatable)
    #[arg(short, long = "select")]
    pub select: Vec<String>,

    /// Table page (1-based)
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Table page size
    #[arg(long, default_value = "50")]
    pub page_size: usize,

    /// Run the query this many times and print aggregated statistics
    #[arg(long, default_value = "1")]
    pub repeat: u32,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `export` command
#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub query: QueryOverrides,

    /// Export layout: flat | pivot (configured layout when absent)
    #[arg(long)]
    pub format: Option<ExportLayout>,

    /// Write to this file ("-" for stdout) instead of the configured sinks
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `groups` command
#[derive(Parser, Debug, Clone)]
pub struct GroupsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `serve` command
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Override listen host from configuration
    #[arg(long, env = "FLEETVIEW_HOST")]
    pub host: Option<String>,

    /// Override listen port from configuration
    #[arg(long, env = "FLEETVIEW_PORT")]
    pub port: Option<u16>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "fleetview.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "fleetview.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Printed result of `query`
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum View {
    /// Full and selected time series
    #[default]
    Series,
    /// One page of the flat row table
    Table,
    /// Vehicle x bucket matrix
    Pivot,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
