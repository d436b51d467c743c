use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::context::AgentContext;

use super::handlers;

pub fn build_router(context: Arc<AgentContext>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ping", get(handlers::ping))
        .route("/health/detailed", get(handlers::health_detailed))
        .route("/commands", post(handlers::post_commands))
        .route("/telemetry", get(handlers::telemetry))
        .with_state(context)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
