use axum::{
    routing::{get, post},
    Router,
};
use relay_agent::RelayPipeline;
use relay_core::RelayConfig;
use std::sync::Arc;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: RelayConfig,
    /// Shared with spawned exchange tasks, which outlive the request borrow.
    pub pipeline: Arc<RelayPipeline>,
}

impl AppState {
    pub fn new(config: RelayConfig, pipeline: RelayPipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let webhook_path = route_path(&state.config.gateway.webhook_path);
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(&webhook_path, post(crate::http::webhook::webhook_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn route_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
