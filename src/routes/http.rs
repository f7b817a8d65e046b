// GET handlers: version, point-in-time metrics, monitor status and history

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::history::HistoryPoint;
use crate::models::ResourceId;
use crate::monitor::MonitorPhase;
use crate::sampler::Sampler;
use crate::version::{NAME, VERSION};

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/metrics — one fresh snapshot of this host; what remote monitors sample.
pub(super) async fn metrics_handler<S: Sampler + 'static>(
    State(state): State<AppState<S>>,
) -> Response {
    let Some(source) = state.metrics_source.as_ref() else {
        return error_response(StatusCode::NOT_FOUND, "local metrics are disabled");
    };
    match source.fetch().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, operation = "api_metrics", "metrics fetch failed");
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MonitorSummary {
    name: String,
    phase: MonitorPhase,
    stale: bool,
}

/// GET /api/monitors
pub(super) async fn list_monitors<S: Sampler + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let monitors: Vec<MonitorSummary> = state
        .registry
        .iter()
        .map(|m| {
            let status = m.status();
            MonitorSummary {
                name: status.name,
                phase: status.phase,
                stale: status.stale,
            }
        })
        .collect();
    Json(monitors)
}

/// GET /api/monitors/{name} — latest snapshot, staleness, last error and alert levels.
pub(super) async fn monitor_status<S: Sampler + 'static>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
) -> Response {
    match state.registry.get(&name) {
        Some(monitor) => Json(monitor.status()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("unknown monitor '{}'", name)),
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryBody {
    resource: ResourceId,
    /// Points are always oldest first; the newest sample is last (rightmost on a chart).
    order: &'static str,
    capacity: usize,
    points: Vec<HistoryPoint>,
}

/// GET /api/monitors/{name}/history/{resource}?limit=N
pub(super) async fn monitor_history<S: Sampler + 'static>(
    State(state): State<AppState<S>>,
    Path((name, resource)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let Some(monitor) = state.registry.get(&name) else {
        return error_response(StatusCode::NOT_FOUND, format!("unknown monitor '{}'", name));
    };
    let resource: ResourceId = match resource.trim_start_matches('/').parse() {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let points = match query.limit {
        Some(n) => monitor.history_tail(&resource, n),
        None => monitor.history(&resource),
    };
    match points {
        Some(points) => Json(HistoryBody {
            resource,
            order: "oldest-first",
            capacity: monitor.settings().history_capacity,
            points,
        })
        .into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("no history for '{}' on monitor '{}'", resource, name),
        ),
    }
}
