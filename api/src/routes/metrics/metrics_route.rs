use std::sync::Arc;

use axum::{Json, extract::State};

use pr_gate::metrics::MetricsSnapshot;

use crate::core::app_state::AppState;

/// GET /metrics — aggregate review counters (in-memory, reset on restart).
pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.gate.metrics.snapshot())
}
