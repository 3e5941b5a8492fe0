use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use ballotwatch_core::WatcherState;
use serde::Serialize;

use crate::main_lib::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub state: WatcherState,
    pub open_feeds: usize,
    pub subscribers: usize,
}

async fn healthz() -> &'static str {
    "ok"
}

/// Ready only while the watcher is running.
async fn readyz(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Readiness>) {
    let status = if state.watcher.is_running() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = Readiness {
        state: state.watcher.state(),
        open_feeds: state.watcher.open_feeds(),
        subscribers: state.event_bus.subscriber_count(),
    };
    (status, Json(body))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
