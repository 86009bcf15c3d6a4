//! # API Server
//!
//! HTTP API over the query pipeline.
//!
//! ## Endpoints
//!
//! - `GET /health`
//! - `GET /api/v1/groups`
//! - `GET /api/v1/metrics/{timeseries,table,pivot}`: JSON
//! - `GET /api/v1/metrics/export.csv`: CSV download
//!
//! Metrics endpoints accept `metric`, `scope`, `group_id`, `granularity`,
//! `from` and `to`; the series endpoint also `mode` and repeated
//! `select=<name>|<serial>`.

mod error;
mod handlers;
mod params;
mod state;

use std::sync::Arc;

use axum::{routing::get, Router};
use tracing::info;

pub use error::ApiError;
pub use params::RequestParams;
pub use state::AppState;

/// Build the axum router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::handle_index))
        .route("/health", get(handlers::handle_health))
        .route("/api/v1/groups", get(handlers::handle_groups))
        .route("/api/v1/metrics/timeseries", get(handlers::handle_timeseries))
        .route("/api/v1/metrics/table", get(handlers::handle_table))
        .route("/api/v1/metrics/pivot", get(handlers::handle_pivot))
        .route("/api/v1/metrics/export.csv", get(handlers::handle_export_csv))
        .with_state(Arc::new(state))
}

/// Serve until the listener fails
pub async fn run_server(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "fleetview API listening");
    axum::serve(listener, app).await
}
