//! Status HTTP surface.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /status` | [`BridgeStatus`] as JSON |
//! | `GET /health` | 200 while running, 503 while halted |
//! | `GET /submissions` | Audit records, oldest first |
//! | `GET /events` | Event bus delivery counters |
//! | `GET /metrics` | Prometheus text |

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use mb_07_submission::SubmissionRecord;
use mb_08_finalization::{BridgeStatus, FinalizationHandle, FinalizationState};
use serde::Serialize;
use shared_bus::{BusStats, InMemoryEventBus};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `halted`
    pub status: &'static str,
    /// Orchestrator state
    pub state: FinalizationState,
    /// Last finalized parent height
    pub last_finalized_parent_height: Option<u64>,
}

/// What the routes read from.
#[derive(Clone)]
pub struct StatusState {
    /// Orchestrator status and audit log.
    pub handle: FinalizationHandle,
    /// Bus whose counters `/events` reports.
    pub bus: Arc<InMemoryEventBus>,
}

/// Routes over `state`.
pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/health", get(health))
        .route("/submissions", get(submissions))
        .route("/events", get(events))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn status(State(state): State<StatusState>) -> Json<BridgeStatus> {
    Json(state.handle.status())
}

async fn health(State(state): State<StatusState>) -> (StatusCode, Json<HealthResponse>) {
    let status = state.handle.status();
    let (code, label) = if status.is_halted() {
        (StatusCode::SERVICE_UNAVAILABLE, "halted")
    } else {
        (StatusCode::OK, "ok")
    };
    (
        code,
        Json(HealthResponse {
            status: label,
            state: status.state,
            last_finalized_parent_height: status.last_finalized_parent_height,
        }),
    )
}

async fn submissions(State(state): State<StatusState>) -> Json<Vec<SubmissionRecord>> {
    Json(state.handle.submissions())
}

async fn events(State(state): State<StatusState>) -> Json<BusStats> {
    Json(state.bus.stats())
}

async fn metrics() -> Response {
    match bridge_telemetry::render_metrics() {
        Ok(text) => text.into_response(),
        Err(e) => {
            warn!("[runtime] Metrics rendering failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve until `shutdown` flips to `true`.
pub async fn serve(
    listener: TcpListener,
    state: StatusState,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("[runtime] 📡 Status endpoint listening on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
}
