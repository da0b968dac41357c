use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use tickethub_core::reporting;

use crate::AppState;

/// Liveness and database connectivity check.
/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database = match reporting::ping(&state.pool).await {
        Ok(()) => "connected",
        Err(err) => {
            tracing::warn!("health check database ping failed: {:?}", err);
            "disconnected"
        }
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}
