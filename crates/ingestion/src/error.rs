//! Ingestion error types

use contracts::{ContractError, ErrorClass};
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Dataset file could not be read or parsed
    #[error("failed to load dataset '{path}': {message}")]
    DatasetLoad {
        /// Dataset path
        path: String,
        /// Error message
        message: String,
    },

    /// Source returned the cursor it was just called with
    #[error("source '{source_name}' did not advance past cursor '{cursor}'")]
    StalledCursor {
        /// Source name
        source_name: String,
        /// Repeated cursor
        cursor: String,
    },

    /// Stage error from a source or the query itself
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl IngestionError {
    /// Coarse class for user messaging
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::DatasetLoad { .. } => ErrorClass::Config,
            Self::StalledCursor { .. } => ErrorClass::Transport,
            Self::Contract(e) => e.class(),
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
