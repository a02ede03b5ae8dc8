/// API Routes definition

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::core::metrics::MetricsProvider;

pub fn create_router(provider: Arc<MetricsProvider>, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .route("/api/v1/hello", get(handlers::hello))
        .route("/api/v1/info", get(handlers::system_info))
        .route("/health", get(handlers::health_check))
        .route("/", get(handlers::root))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        .with_state(provider);

    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app
}
