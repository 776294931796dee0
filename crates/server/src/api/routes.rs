use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{dispatcher, handlers, ingest, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Ingestion
        .route("/ingest", post(ingest::ingest))
        .route("/status/{id}", get(ingest::get_status))
        // Dispatcher
        .route("/dispatcher/status", get(dispatcher::get_status))
        .with_state(Arc::clone(&state));

    // Unversioned paths kept for existing clients
    let root_routes = Router::new()
        .route("/ingest", post(ingest::ingest))
        .route("/status/{id}", get(ingest::get_status))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(root_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
