use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health: liveness probe, returns relay metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let generator = state.pipeline.generator();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "persona": generator.persona().name,
        "model": generator.model(),
        "generation_configured": generator.is_configured(),
        "active_exchanges": state.pipeline.active_identities(),
    }))
}
