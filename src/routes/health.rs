use std::time::SystemTime;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/info", get(info))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    value_table: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInfoResponse {
    service: &'static str,
    version: String,
    start_time: String,
    uptime: u64,
    table: TableInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TableInfo {
    store: String,
    entries: usize,
    unsaved_changes: bool,
    levels: usize,
}

/// Degraded while the table holds updates the store rejected.
async fn root(State(state): State<AppState>) -> Response {
    let unsaved = state.selector().has_unsaved_changes();

    let response = HealthResponse {
        status: if unsaved { "degraded" } else { "ok" },
        timestamp: now_iso(),
        value_table: if unsaved { "unsaved" } else { "persisted" },
    };

    let status_code = if unsaved {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    Json(LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
    })
    .into_response()
}

async fn info(State(state): State<AppState>) -> Response {
    let selector = state.selector();

    let response = HealthInfoResponse {
        service: "lingua-adaptive-selector",
        version: std::env::var("APP_VERSION")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        start_time: system_time_iso(state.started_at_system()),
        uptime: state.uptime_seconds(),
        table: TableInfo {
            store: selector.store_description(),
            entries: selector.entry_count(),
            unsaved_changes: selector.has_unsaved_changes(),
            levels: selector.catalog().level_count(),
        },
    };

    Json(response).into_response()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn system_time_iso(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}
