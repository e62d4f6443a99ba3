//! Snapshot read handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::error::SnapshotError;
use crate::http::responses::{error_response, SnapshotListResponse, SnapshotResponse};
use crate::state::AppState;

/// List snapshots, newest first.
pub async fn list_snapshots(State(state): State<Arc<AppState>>) -> Response {
    match state.snapshots().list().await {
        Ok(snapshots) => Json(SnapshotListResponse {
            success: true,
            total_count: snapshots.len(),
            data: snapshots,
        })
        .into_response(),
        Err(e) => snapshot_error(e),
    }
}

/// Read one snapshot by file name.
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    match state.snapshots().read(&name).await {
        Ok(snapshot) => Json(SnapshotResponse {
            success: true,
            name,
            snapshot,
        })
        .into_response(),
        Err(e) => snapshot_error(e),
    }
}

fn snapshot_error(e: SnapshotError) -> Response {
    let status = match &e {
        SnapshotError::NotFound(_) => StatusCode::NOT_FOUND,
        SnapshotError::InvalidName(_) => StatusCode::BAD_REQUEST,
        SnapshotError::Io(_) | SnapshotError::Json(_) => {
            error!(error = %e, "Failed to read snapshots");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pipeline::tests::StubAcquirer;
    use anifetch_core::{CanonicalItem, Success, TaskKind};
    use axum::body::to_bytes;
    use chrono::Utc;
    use serde_json::Value;

    async fn body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            snapshot_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let state = AppState::with_acquirer(config, Arc::new(StubAcquirer::ok("{}")));
        let success = Success {
            items: vec![CanonicalItem::new("光死去的夏天").with_current_episode(3)],
            source_url: "http://www.iyinghua.com".to_string(),
            timestamp: Utc::now(),
            title: None,
        };
        state.snapshots().write(TaskKind::Latest, &success).await.unwrap();

        let listing = body(list_snapshots(State(state.clone())).await).await;
        assert_eq!(listing["total_count"], 1);
        let name = listing["data"][0]["name"].as_str().unwrap().to_string();

        let response = get_snapshot(State(state), Path(name.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let snapshot = body(response).await;
        assert_eq!(snapshot["name"], name.as_str());
        assert_eq!(snapshot["total_count"], 1);
        assert_eq!(snapshot["data"][0]["title"], "光死去的夏天");
    }

    #[tokio::test]
    async fn test_read_status_codes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            snapshot_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let state = AppState::with_acquirer(config, Arc::new(StubAcquirer::ok("{}")));

        let missing = get_snapshot(State(state.clone()), Path("nope.json".to_string())).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let invalid = get_snapshot(State(state), Path("..%2Fsecret".to_string())).await;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }
}
