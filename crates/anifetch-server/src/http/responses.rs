//! HTTP request and response types.

use anifetch_core::video::{episode_from_page_url, episode_label, play_url};
use anifetch_core::{CanonicalItem, Snapshot};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::{DataSource, Resolution};
use crate::snapshot::SnapshotInfo;

/// Message shown alongside fallback data.
pub const DEGRADED_MESSAGE: &str = "live data unavailable, serving fallback data";

// ============================================================================
// Acquisition types
// ============================================================================

/// Envelope returned by every acquisition endpoint.
#[derive(Debug, Serialize)]
pub struct AcquisitionResponse {
    pub success: bool,
    pub data: Vec<CanonicalItem>,
    pub total_count: usize,
    pub timestamp: DateTime<Utc>,
    pub source_url: String,
    pub data_source: DataSource,
    pub degraded: bool,

    /// Snapshot written for this response, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Show title for episode lists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Resolution> for AcquisitionResponse {
    fn from(resolution: Resolution) -> Self {
        let degraded = resolution.degraded();
        Self {
            success: true,
            total_count: resolution.total_count(),
            data: resolution.items,
            timestamp: resolution.timestamp,
            source_url: resolution.source_url,
            data_source: resolution.data_source,
            degraded,
            file_path: resolution
                .snapshot_path
                .map(|path| path.display().to_string()),
            title: resolution.title,
            error: degraded.then(|| DEGRADED_MESSAGE.to_string()),
        }
    }
}

/// Body of `POST /api/latest-update`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestUpdateRequest {
    #[serde(default = "default_true")]
    pub use_real_data: bool,

    /// Number or numeric string; defaults to 50.
    #[serde(default)]
    pub limit: Option<Value>,

    #[serde(default = "default_true")]
    pub save_to_file: bool,
}

impl Default for LatestUpdateRequest {
    fn default() -> Self {
        Self {
            use_real_data: true,
            limit: None,
            save_to_file: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Video types
// ============================================================================

/// Response of `GET /api/video/play`.
#[derive(Debug, Serialize)]
pub struct VideoPlayResponse {
    pub success: bool,
    pub data: VideoPlayData,
    pub timestamp: DateTime<Utc>,
    pub data_source: DataSource,
    pub degraded: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VideoPlayResponse {
    /// Compose the play response for a video resolution of `page_url`.
    ///
    /// `title` and `episode` override what the resolution and page URL carry.
    pub fn from_resolution(
        resolution: Resolution,
        page_url: &str,
        title: Option<String>,
        episode: Option<String>,
    ) -> Self {
        let video_url = resolution
            .items
            .first()
            .filter(|_| resolution.data_source == DataSource::Live)
            .and_then(|item| item.detail_url.as_deref())
            .map(|video| play_url(video, page_url))
            .unwrap_or_default();
        let episode = episode.unwrap_or_else(|| {
            episode_label(episode_from_page_url(page_url).unwrap_or(1))
        });
        let degraded = resolution.degraded()
            || (resolution.data_source == DataSource::Live && video_url.is_empty());

        Self {
            success: true,
            data: VideoPlayData {
                video_url,
                title: title.or(resolution.title),
                episode,
                source_url: page_url.to_string(),
            },
            timestamp: resolution.timestamp,
            data_source: resolution.data_source,
            degraded,
            error: degraded.then(|| DEGRADED_MESSAGE.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VideoPlayData {
    /// Playable address; empty when the video could not be resolved.
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub episode: String,
    /// Episode page the video was resolved from.
    pub source_url: String,
}

// ============================================================================
// Snapshot types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SnapshotListResponse {
    pub success: bool,
    pub data: Vec<SnapshotInfo>,
    pub total_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub success: bool,
    pub name: String,
    #[serde(flatten)]
    pub snapshot: Snapshot,
}

// ============================================================================
// Endpoint listing
// ============================================================================

/// One entry of `GET /api/endpoints`.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
    pub params: &'static [&'static str],
}

// ============================================================================
// Error types
// ============================================================================

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Build an error response with the given status.
pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: error.into(),
        }),
    )
        .into_response()
}
