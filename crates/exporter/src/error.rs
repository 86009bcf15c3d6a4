//! Exporter error types

use contracts::{ContractError, ErrorClass};
use thiserror::Error;

/// Exporter-specific errors
#[derive(Debug, Error)]
pub enum ExportError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// CSV writer error
    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),

    /// Writer produced invalid UTF-8
    #[error("csv output is not valid utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Empty export or sink write error (from contract)
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::SinkCreation { .. } => ErrorClass::Config,
            Self::Contract(e) => e.class(),
            Self::Csv(_) | Self::Encoding(_) | Self::Io(_) => ErrorClass::Internal,
        }
    }
}

/// Exporter Result type alias
pub type Result<T> = std::result::Result<T, ExportError>;
