use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use diskwatch_common::types::{format_bytes, DiskSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform response envelope.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// Zero on success.
    pub err_code: i32,
    /// "success" on success.
    pub err_msg: String,
    pub trace_id: String,
    pub data: Option<T>,
}

pub fn success_response<T>(status: StatusCode, trace_id: &str, data: T) -> Response
where
    T: Serialize,
{
    (
        status,
        Json(ApiResponse {
            err_code: 0,
            err_msg: "success".to_string(),
            trace_id: trace_id.to_string(),
            data: Some(data),
        }),
    )
        .into_response()
}

fn to_custom_error_code(code: &str) -> i32 {
    match code {
        "bad_request" => 1001,
        "not_found" => 1004,
        "internal_error" => 1500,
        "storage_error" => 1501,
        _ => 1999,
    }
}

pub fn error_response(status: StatusCode, trace_id: &str, code: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: to_custom_error_code(code),
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

/// One mount's current usage, with human-readable byte strings for the
/// dashboard alongside the raw counts.
#[derive(Serialize)]
struct DiskView {
    mount: String,
    total_bytes: u64,
    total: String,
    available_bytes: u64,
    available: String,
    used_bytes: u64,
    used: String,
    percent_used: u8,
}

impl From<&DiskSnapshot> for DiskView {
    fn from(snapshot: &DiskSnapshot) -> Self {
        Self {
            mount: snapshot.mount.clone(),
            total_bytes: snapshot.total_bytes,
            total: format_bytes(snapshot.total_bytes),
            available_bytes: snapshot.available_bytes,
            available: format_bytes(snapshot.available_bytes),
            used_bytes: snapshot.used_bytes,
            used: format_bytes(snapshot.used_bytes),
            percent_used: snapshot.percent_used,
        }
    }
}

#[derive(Serialize)]
struct HealthInfo {
    status: &'static str,
    uptime_secs: i64,
    watched_mounts: usize,
}

pub async fn health(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    success_response(
        StatusCode::OK,
        &trace_id,
        HealthInfo {
            status: "ok",
            uptime_secs: (Utc::now() - state.start_time).num_seconds(),
            watched_mounts: state.snapshots.load().len(),
        },
    )
}

/// Current snapshots for all watched mounts, in watchlist order.
pub async fn list_disks(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let snapshots = state.snapshots.load();
    let disks: Vec<DiskView> = snapshots.iter().map(DiskView::from).collect();
    success_response(StatusCode::OK, &trace_id, disks)
}

#[derive(Deserialize)]
pub struct MountQuery {
    mount: String,
}

/// Trend report for one watched mount.
pub async fn trend(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(query): Query<MountQuery>,
) -> impl IntoResponse {
    let snapshots = state.snapshots.load();
    let Some(snapshot) = snapshots.iter().find(|s| s.mount == query.mount) else {
        return error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            &format!("mount '{}' is not watched", query.mount),
        );
    };

    match state.trend.evaluate(snapshot, Utc::now().timestamp()) {
        Ok(report) => success_response(StatusCode::OK, &trace_id, report),
        Err(e) => {
            tracing::error!(mount = %query.mount, error = %e, "Trend query failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "storage_error",
                "trend query failed",
            )
        }
    }
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    mount: String,
    since: Option<i64>,
}

#[derive(Serialize)]
struct HistoryPoint {
    time: i64,
    bytes: u64,
}

/// Recorded samples for one watched mount, timestamp ascending.
pub async fn history(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let snapshots = state.snapshots.load();
    if !snapshots.iter().any(|s| s.mount == query.mount) {
        return error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            &format!("mount '{}' is not watched", query.mount),
        );
    }

    match state.store.history(&query.mount, query.since) {
        Ok(samples) => {
            let points: Vec<HistoryPoint> = samples
                .iter()
                .map(|s| HistoryPoint {
                    time: s.timestamp,
                    bytes: s.available_bytes,
                })
                .collect();
            success_response(StatusCode::OK, &trace_id, points)
        }
        Err(e) => {
            tracing::error!(mount = %query.mount, error = %e, "History query failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "storage_error",
                "history query failed",
            )
        }
    }
}

/// The embedded dashboard page.
pub async fn dashboard() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}
