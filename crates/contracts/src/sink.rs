//! ExportSink trait - delivery of rendered CSV exports
//!
//! The exporter renders; sinks only deliver bytes somewhere.

use serde::{Deserialize, Serialize};

use crate::{ContractError, Granularity, Metric};

/// A rendered CSV document plus what it describes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvExport {
    pub layout: ExportLayout,
    pub metric: Metric,
    pub granularity: Granularity,
    /// Data lines, excluding the header
    pub line_count: usize,
    pub content: String,
}

/// Shape of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportLayout {
    /// One line per normalized row
    #[default]
    Flat,
    /// One line per vehicle, one column per bucket
    Pivot,
}

impl ExportLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Pivot => "pivot",
        }
    }
}

impl std::str::FromStr for ExportLayout {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "pivot" => Ok(Self::Pivot),
            other => Err(ContractError::config_validation(
                "format",
                format!("unsupported export layout '{other}'"),
            )),
        }
    }
}

/// Export output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(ExportSink: Send)]
pub trait LocalExportSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one export
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn deliver(&mut self, export: &CsvExport) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
