use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use super::{detection, handlers, middleware::cors_layer, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.config().server;
    let body_limit = server.body_limit_bytes();
    let cors = cors_layer(&server.cors_origins);

    // Detection job routes
    let detection_routes = Router::new()
        .route("/video", post(detection::submit_video))
        .route("/stream", post(detection::submit_stream))
        .route("/archive", post(detection::submit_archive))
        .route("/cancel/{id}", post(detection::cancel_job))
        .route("/result/{id}", get(detection::get_result));

    Router::new()
        .nest("/api/detection", detection_routes)
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
