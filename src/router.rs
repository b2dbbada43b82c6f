//! Request routing for the metrics endpoint.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::retention::{RetentionMetrics, RetentionVars};

/// Application state shared between handlers.
#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<RetentionMetrics>,
}

/// Body of `GET /debug/vars`.
#[derive(Debug, Clone, Serialize)]
pub struct Vars {
    pub retention: RetentionVars,
}

/// Creates the router for the metrics endpoint.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/debug/vars", get(vars_handler))
        .route("/healthz", get(health_handler))
        .with_state(state)
}

async fn vars_handler(State(state): State<AppState>) -> Json<Vars> {
    Json(Vars {
        retention: state.metrics.snapshot(),
    })
}

async fn health_handler() -> &'static str {
    "ok"
}
