//! Acquisition handlers: latest updates, search, episode lists and video.
//!
//! Bad input is the only error callers ever see (400). Every acquisition
//! failure degrades to seed data with a 200.

use std::collections::HashMap;
use std::sync::Arc;

use anifetch_core::{parse_flag, AcquisitionTask, TaskKind};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::warn;

use crate::http::responses::{
    error_response, AcquisitionResponse, LatestUpdateRequest, VideoPlayResponse,
};
use crate::pipeline::{DataSource, ResolveOptions};
use crate::state::AppState;

/// Cache policy for live latest-update listings.
pub const LIVE_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";

/// Default `limit` of the POST latest-update body.
const POST_DEFAULT_LIMIT: &str = "50";

/// `GET /api/latest-update?limit&real&save`
pub async fn latest_update(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (task, options) = match prepare(&state, TaskKind::Latest, &params) {
        Ok(prepared) => prepared,
        Err(response) => return response,
    };
    let resolution = state.pipeline.resolve(&task, options).await;
    let cache = if resolution.data_source == DataSource::Live {
        LIVE_CACHE_CONTROL
    } else {
        "no-cache"
    };
    (
        [(header::CACHE_CONTROL, cache)],
        Json(AcquisitionResponse::from(resolution)),
    )
        .into_response()
}

/// `POST /api/latest-update` with `{ useRealData, limit, saveToFile }`.
///
/// A missing or unreadable body behaves like `{}`.
pub async fn latest_update_post(
    State(state): State<Arc<AppState>>,
    body: Option<Json<LatestUpdateRequest>>,
) -> Response {
    let body = body.map(|Json(body)| body).unwrap_or_default();

    let limit = match &body.limit {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => POST_DEFAULT_LIMIT.to_string(),
    };
    let params = HashMap::from([("limit".to_string(), limit)]);
    let task = match state.normalizer.normalize(TaskKind::Latest, &params) {
        Ok(task) => task,
        Err(e) => return reject(&state, e),
    };
    let options = ResolveOptions {
        live: body.use_real_data,
        persist: body.save_to_file,
    };

    let resolution = state.pipeline.resolve(&task, options).await;
    (
        [(header::CACHE_CONTROL, "no-cache")],
        Json(AcquisitionResponse::from(resolution)),
    )
        .into_response()
}

/// `GET /api/search?q&limit&real&save`
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    respond(&state, TaskKind::Search, params).await
}

/// `GET /api/anime/:id?limit&real&save`
pub async fn episodes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Response {
    params.insert("id".to_string(), id);
    respond(&state, TaskKind::Episodes, params).await
}

/// `GET /api/video/play?url&title&episode`
pub async fn video_play(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (task, options) = match prepare(&state, TaskKind::Video, &params) {
        Ok(prepared) => prepared,
        Err(response) => return response,
    };
    let page_url = task.param("url").unwrap_or_default().to_string();
    let resolution = state.pipeline.resolve(&task, options).await;
    let task_id = resolution.task_id.clone();

    let response = VideoPlayResponse::from_resolution(
        resolution,
        &page_url,
        non_blank(&params, "title"),
        non_blank(&params, "episode"),
    );
    if response.degraded {
        warn!(task_id = %task_id, page_url = %page_url, "Video address not resolved");
    }
    Json(response).into_response()
}

async fn respond(state: &AppState, kind: TaskKind, params: HashMap<String, String>) -> Response {
    let (task, options) = match prepare(state, kind, &params) {
        Ok(prepared) => prepared,
        Err(response) => return response,
    };
    let resolution = state.pipeline.resolve(&task, options).await;
    Json(AcquisitionResponse::from(resolution)).into_response()
}

/// Validate parameters and read the `real`/`save` switches.
fn prepare(
    state: &AppState,
    kind: TaskKind,
    params: &HashMap<String, String>,
) -> Result<(AcquisitionTask, ResolveOptions), Response> {
    let task = state
        .normalizer
        .normalize(kind, params)
        .map_err(|e| reject(state, e))?;

    let flag = |key: &str| parse_flag(params.get(key).map(String::as_str));
    let options = ResolveOptions {
        live: flag("real").unwrap_or(state.config.live_by_default),
        persist: flag("save").unwrap_or(false),
    };
    Ok((task, options))
}

fn reject(state: &AppState, error: anifetch_core::CoreError) -> Response {
    warn!(error = %error, "Rejected request");
    state.metrics.record_invalid_request();
    error_response(StatusCode::BAD_REQUEST, error.to_string())
}

fn non_blank(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
