//! Layered error definitions
//!
//! Categorized by source: config / transport / result / export / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// A required connection or query parameter was not supplied
    #[error("missing required parameter '{field}'")]
    MissingParameter { field: String },

    // ===== Transport Errors =====
    /// A page, metadata or group fetch did not succeed
    #[error("transport error from '{source_name}': {message}")]
    Transport {
        source_name: String,
        message: String,
    },

    // ===== Result Errors =====
    /// Scoped query resolved to zero target devices
    #[error("no devices found for {scope}")]
    EmptyResult { scope: String },

    /// Export attempted with no materialized rows
    #[error("nothing to export: {what} is empty")]
    EmptyExport { what: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Coarse error class, used by callers to pick user messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Fetch failed; the whole query cycle may be re-run
    Transport,
    /// Caller must re-prompt for parameters
    Config,
    /// Valid empty state ("no devices"), not a failure
    EmptyResult,
    /// Nothing materialized to export
    EmptyExport,
    /// Anything else (IO, sinks)
    Internal,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Config => "config",
            Self::EmptyResult => "empty_result",
            Self::EmptyExport => "empty_export",
            Self::Internal => "internal",
        }
    }
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create missing parameter error
    pub fn missing_parameter(field: impl Into<String>) -> Self {
        Self::MissingParameter {
            field: field.into(),
        }
    }

    /// Create transport error
    pub fn transport(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create empty result error
    pub fn empty_result(scope: impl Into<String>) -> Self {
        Self::EmptyResult {
            scope: scope.into(),
        }
    }

    /// Create empty export error
    pub fn empty_export(what: impl Into<String>) -> Self {
        Self::EmptyExport { what: what.into() }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ConfigParse { .. }
            | Self::ConfigValidation { .. }
            | Self::MissingParameter { .. } => ErrorClass::Config,
            Self::Transport { .. } => ErrorClass::Transport,
            Self::EmptyResult { .. } => ErrorClass::EmptyResult,
            Self::EmptyExport { .. } => ErrorClass::EmptyExport,
            Self::SinkWrite { .. } | Self::Io(_) | Self::Other(_) => ErrorClass::Internal,
        }
    }
}
