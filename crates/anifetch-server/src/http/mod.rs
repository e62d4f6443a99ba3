//! HTTP server for anifetch.
//!
//! Provides endpoints for:
//! - Latest updates (`/api/latest-update`)
//! - Search (`/api/search`)
//! - Episode lists (`/api/anime/:id`)
//! - Video play URLs (`/api/video/play`)
//! - Snapshots (`/api/snapshots`, `/api/snapshots/:name`)
//! - Endpoint listing (`/api/endpoints`)
//! - Health check (`/health`)
//! - Prometheus metrics (`/metrics`)

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod handlers;
pub mod responses;

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    // The UI is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // API routes
        .route(
            "/api/latest-update",
            get(handlers::latest_update).post(handlers::latest_update_post),
        )
        .route("/api/search", get(handlers::search))
        .route("/api/anime/:id", get(handlers::episodes))
        .route("/api/video/play", get(handlers::video_play))
        .route("/api/snapshots", get(handlers::list_snapshots))
        .route("/api/snapshots/:name", get(handlers::get_snapshot))
        .route("/api/endpoints", get(handlers::list_endpoints))
        // Observability routes
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
