//! Error types for CLI operations.

use contracts::ErrorClass;
use exporter::ExportError;
use ingestion::IngestionError;
use thiserror::Error;

/// CLI-specific error types
///
/// Pipeline errors are reduced to their class so the message tells the user
/// what to do next rather than which stage failed.
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Query parameters or configuration rejected
    #[error("Invalid query or configuration: {message}")]
    InvalidInput { message: String },

    /// The record source could not be read
    #[error("Data source unavailable: {message}")]
    SourceUnavailable { message: String },

    /// Scoped query matched no devices
    #[error("No devices in the selected scope: {message}")]
    NoDevices { message: String },

    /// Export requested with nothing to export
    #[error("Nothing to export: {message}")]
    NothingToExport { message: String },

    /// One or more sinks failed
    #[error("Export delivery failed for sink(s): {}", sinks.join(", "))]
    Delivery { sinks: Vec<String> },

    /// Internal failure
    #[error("{message}")]
    Internal { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Pick user messaging by error class
    pub fn from_class(class: ErrorClass, message: impl Into<String>) -> Self {
        let message = message.into();
        match class {
            ErrorClass::Config => Self::InvalidInput { message },
            ErrorClass::Transport => Self::SourceUnavailable { message },
            ErrorClass::EmptyResult => Self::NoDevices { message },
            ErrorClass::EmptyExport => Self::NothingToExport { message },
            ErrorClass::Internal => Self::Internal { message },
        }
    }

    /// Class of a pipeline error; `None` for CLI-only failures
    pub fn class(&self) -> Option<ErrorClass> {
        match self {
            Self::InvalidInput { .. } => Some(ErrorClass::Config),
            Self::SourceUnavailable { .. } => Some(ErrorClass::Transport),
            Self::NoDevices { .. } => Some(ErrorClass::EmptyResult),
            Self::NothingToExport { .. } => Some(ErrorClass::EmptyExport),
            Self::Internal { .. } => Some(ErrorClass::Internal),
            Self::ConfigNotFound { .. } | Self::Delivery { .. } => None,
        }
    }
}

impl From<IngestionError> for CliError {
    fn from(e: IngestionError) -> Self {
        Self::from_class(e.class(), e.to_string())
    }
}

impl From<ExportError> for CliError {
    fn from(e: ExportError) -> Self {
        Self::from_class(e.class(), e.to_string())
    }
}

impl From<contracts::ContractError> for CliError {
    fn from(e: contracts::ContractError) -> Self {
        Self::from_class(e.class(), e.to_string())
    }
}
