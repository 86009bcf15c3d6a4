//! API error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use contracts::{ContractError, ErrorClass};
use exporter::ExportError;
use ingestion::IngestionError;
use thiserror::Error;

/// Error returned by a handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ApiError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Ingestion(e) => e.class(),
            Self::Export(e) => e.class(),
            Self::Contract(e) => e.class(),
        }
    }

    /// Config → 400, empty result or export → 404, transport → 502
    pub fn status(&self) -> StatusCode {
        match self.class() {
            ErrorClass::Config => StatusCode::BAD_REQUEST,
            ErrorClass::EmptyResult | ErrorClass::EmptyExport => StatusCode::NOT_FOUND,
            ErrorClass::Transport => StatusCode::BAD_GATEWAY,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, class = self.class().as_str(), "request failed");
        } else {
            tracing::debug!(error = %self, class = self.class().as_str(), "request rejected");
        }

        let body = serde_json::json!({
            "status": "error",
            "class": self.class().as_str(),
            "error": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
