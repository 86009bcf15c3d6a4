//! Route handlers
//!
//! Every metrics endpoint runs a fresh query cycle. A group without devices
//! is not an error for the JSON endpoints: they answer `no_devices` with an
//! empty payload.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use contracts::{ContractError, ExportLayout, PivotMatrix, RecordSource, SeriesSet, TablePage};
use exporter::{ExportSource, FileSinkConfig};
use ingestion::{IngestionError, QueryResult};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::error::ApiError;
use crate::params::RequestParams;
use crate::state::AppState;

type Pairs = Query<Vec<(String, String)>>;

/// Result of running the cycle behind a metrics request
enum Outcome {
    Rows(RequestParams, QueryResult),
    NoDevices(RequestParams, String),
}

async fn run(state: &AppState, pairs: &[(String, String)]) -> Result<Outcome, ApiError> {
    let params = RequestParams::parse(pairs, &state.defaults, state.today())?;
    match state.runner.run_query(&params.query).await {
        Ok(result) => Ok(Outcome::Rows(params, result)),
        Err(IngestionError::Contract(ContractError::EmptyResult { scope })) => {
            debug!(%scope, "query resolved to no devices");
            Ok(Outcome::NoDevices(params, scope))
        }
        Err(e) => Err(e.into()),
    }
}

fn ok_body(result: &QueryResult, key: &str, payload: impl Serialize) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "params": result.params,
        "stats": result.stats,
        key: payload,
    }))
}

fn no_devices_body(
    params: &RequestParams,
    scope: &str,
    key: &str,
    payload: impl Serialize,
) -> Json<Value> {
    Json(json!({
        "status": "no_devices",
        "message": format!("no devices found for {scope}"),
        "params": params.query,
        key: payload,
    }))
}

pub async fn handle_index() -> Json<Value> {
    Json(json!({
        "name": "fleetview",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/": "This API index",
            "/health": "Health check with ingestion counters",
            "/api/v1/groups": "Selectable groups, fleet first",
            "/api/v1/metrics/timeseries": "Full and selected series (mode, select=<name>|<serial>)",
            "/api/v1/metrics/table": "Paged flat rows (page, page_size)",
            "/api/v1/metrics/pivot": "Vehicle x bucket matrix",
            "/api/v1/metrics/export.csv": "CSV download (format=flat|pivot)",
        },
        "query_params": ["metric", "scope", "group_id", "granularity", "from", "to"],
        "examples": {
            "fleet_daily": "/api/v1/metrics/timeseries?metric=distance&granularity=daily",
            "group_pivot": "/api/v1/metrics/pivot?scope=group&group_id=g1&granularity=monthly",
        }
    }))
}

pub async fn handle_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "source": state.runner.source().name(),
        "ingestion": state.runner.metrics().snapshot(),
    }))
}

pub async fn handle_groups(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let groups = state.runner.list_groups().await?;
    Ok(Json(json!({
        "status": "ok",
        "total": groups.len(),
        "groups": groups,
    })))
}

#[instrument(name = "api_timeseries", skip_all)]
pub async fn handle_timeseries(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<Value>, ApiError> {
    Ok(match run(&state, &pairs).await? {
        Outcome::Rows(params, result) => {
            let series = result.series(params.mode, &params.selected);
            ok_body(&result, "series", series)
        }
        Outcome::NoDevices(params, scope) => {
            no_devices_body(&params, &scope, "series", SeriesSet::default())
        }
    })
}

#[instrument(name = "api_table", skip_all)]
pub async fn handle_table(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<Value>, ApiError> {
    Ok(match run(&state, &pairs).await? {
        Outcome::Rows(params, result) => {
            let page = result.table(params.page, params.page_size)?;
            ok_body(&result, "table", page)
        }
        Outcome::NoDevices(params, scope) => {
            let empty = TablePage {
                page: params.page,
                page_size: params.page_size,
                total_rows: 0,
                total_pages: 0,
                rows: Vec::new(),
            };
            no_devices_body(&params, &scope, "table", empty)
        }
    })
}

#[instrument(name = "api_pivot", skip_all)]
pub async fn handle_pivot(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<Value>, ApiError> {
    Ok(match run(&state, &pairs).await? {
        Outcome::Rows(_, result) => {
            let matrix = result.pivot();
            ok_body(&result, "pivot", matrix)
        }
        Outcome::NoDevices(params, scope) => {
            no_devices_body(&params, &scope, "pivot", PivotMatrix::default())
        }
    })
}

/// CSV download; nothing to export answers 404
#[instrument(name = "api_export_csv", skip_all)]
pub async fn handle_export_csv(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Response, ApiError> {
    let (params, result) = match run(&state, &pairs).await? {
        Outcome::Rows(params, result) => (params, result),
        Outcome::NoDevices(_, scope) => {
            return Err(ContractError::empty_export(format!("rows for {scope}")).into());
        }
    };

    let matrix;
    let source = match params.layout {
        ExportLayout::Flat => ExportSource::Rows(&result.rows),
        ExportLayout::Pivot => {
            matrix = result.pivot();
            ExportSource::Pivot(&matrix)
        }
    };
    let export = exporter::render(source, params.query.metric, params.query.granularity)?;

    let file_name = FileSinkConfig {
        prefix: state.file_prefix.clone(),
        ..FileSinkConfig::default()
    }
    .file_name(&export);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        export.content,
    )
        .into_response())
}
