//! Health, metrics and endpoint listing handlers.

use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse, Json};

use crate::http::responses::EndpointInfo;
use crate::state::AppState;

/// Every route the server exposes.
pub const ENDPOINTS: &[EndpointInfo] = &[
    EndpointInfo {
        method: "GET",
        path: "/api/latest-update",
        description: "Latest updated shows",
        params: &["limit", "real", "save"],
    },
    EndpointInfo {
        method: "POST",
        path: "/api/latest-update",
        description: "Latest updated shows, saved to a snapshot by default",
        params: &["useRealData", "limit", "saveToFile"],
    },
    EndpointInfo {
        method: "GET",
        path: "/api/search",
        description: "Search shows by title",
        params: &["q", "limit", "real", "save"],
    },
    EndpointInfo {
        method: "GET",
        path: "/api/anime/:id",
        description: "Episode list of one show",
        params: &["limit", "real", "save"],
    },
    EndpointInfo {
        method: "GET",
        path: "/api/video/play",
        description: "Playable video address for an episode page",
        params: &["url", "title", "episode"],
    },
    EndpointInfo {
        method: "GET",
        path: "/api/snapshots",
        description: "Saved snapshots, newest first",
        params: &[],
    },
    EndpointInfo {
        method: "GET",
        path: "/api/snapshots/:name",
        description: "One saved snapshot",
        params: &[],
    },
    EndpointInfo {
        method: "GET",
        path: "/api/endpoints",
        description: "This listing",
        params: &[],
    },
    EndpointInfo {
        method: "GET",
        path: "/health",
        description: "Liveness check",
        params: &[],
    },
    EndpointInfo {
        method: "GET",
        path: "/metrics",
        description: "Prometheus metrics",
        params: &[],
    },
];

/// Health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Prometheus metrics endpoint.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = crate::metrics::collect_metrics(&state.metrics);
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

/// Endpoint listing.
pub async fn list_endpoints() -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "endpoints": ENDPOINTS,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pipeline::tests::StubAcquirer;
    use axum::body::to_bytes;
    use axum::response::Response;

    async fn text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let body = text(health_check().await.into_response()).await;
        assert_eq!(body, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_metrics_are_prometheus_text() {
        let state = AppState::with_acquirer(Config::default(), Arc::new(StubAcquirer::ok("{}")));
        let response = metrics_handler(State(state)).await.into_response();

        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
        assert!(text(response).await.contains("anifetch_resolutions_total"));
    }

    #[tokio::test]
    async fn test_endpoint_listing_covers_routes() {
        let body = text(list_endpoints().await.into_response()).await;
        assert!(body.contains("/api/video/play"));
        assert_eq!(ENDPOINTS.len(), 10);
    }
}
