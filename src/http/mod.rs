//! Axum HTTP surface: the two job-lifecycle endpoints plus health,
//! readiness, metrics, and the static artifact file service (§4.10/§6).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use crate::config::Config;
use crate::db::Database;
use crate::metrics::Metrics;
use crate::queue::Queue;
use crate::report;

pub struct AppState {
    pub db: Database,
    pub queue: Queue,
    pub metrics: Arc<Metrics>,
    pub config: Config,
}

const RETRY_AFTER_TRIGGER_SECS: &str = "60";
const RETRY_AFTER_RUNNING_SECS: &str = "15";

pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/trigger_report", axum::routing::post(trigger_report))
        .route("/get_report", get(get_report_query))
        .route("/get_report/{report_id}", get(get_report_path))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_endpoint))
        .nest_service("/files/reports", ServeDir::new(static_dir))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(state)
}

#[derive(Serialize)]
struct TriggerResponse {
    report_id: String,
    status: &'static str,
    message: &'static str,
}

async fn trigger_report(State(state): State<Arc<AppState>>) -> Response {
    match report::trigger(&state.db, &state.queue, &state.metrics).await {
        Ok(report_id) => {
            let mut response = (
                StatusCode::ACCEPTED,
                Json(TriggerResponse {
                    report_id,
                    status: "PENDING",
                    message: "report generation started",
                }),
            )
                .into_response();
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from_static(RETRY_AFTER_TRIGGER_SECS));
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "trigger_report failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "internal error"}))).into_response()
        }
    }
}

#[derive(Deserialize)]
struct GetReportQuery {
    report_id: Option<String>,
}

#[derive(Serialize)]
struct GetReportResponse {
    report_id: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

async fn get_report_query(State(state): State<Arc<AppState>>, Query(q): Query<GetReportQuery>) -> Response {
    match q.report_id {
        Some(id) => get_report(&state, &id).await,
        None => (StatusCode::BAD_REQUEST, Json(json!({"error": "report_id is required"}))).into_response(),
    }
}

async fn get_report_path(State(state): State<Arc<AppState>>, AxumPath(report_id): AxumPath<String>) -> Response {
    get_report(&state, &report_id).await
}

async fn get_report(state: &AppState, report_id: &str) -> Response {
    if report_id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "report_id is required"}))).into_response();
    }

    match report::get_status(&state.db, report_id).await {
        Ok(Some(view)) => {
            let mut response = (
                StatusCode::OK,
                Json(GetReportResponse {
                    report_id: view.report_id,
                    status: view.status.as_str(),
                    url: view.url,
                }),
            )
                .into_response();
            if view.status == crate::report::DisplayStatus::Running {
                response
                    .headers_mut()
                    .insert("Retry-After", HeaderValue::from_static(RETRY_AFTER_RUNNING_SECS));
            }
            response
        }
        Ok(None) => (StatusCode::NOT_FOUND, Json(json!({"error": "unknown report_id"}))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "get_report failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "internal error"}))).into_response()
        }
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    let db_ok = tokio::time::timeout(Duration::from_secs(2), state.db.ping())
        .await
        .unwrap_or(false);
    let queue_ok = tokio::time::timeout(Duration::from_secs(2), state.queue.ping())
        .await
        .unwrap_or(false);
    if db_ok && queue_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> String {
    state.metrics.encode()
}
