//! Request Normalizer: shapes raw caller parameters into an [`AcquisitionTask`].

use std::collections::{BTreeMap, HashMap};

use crate::{AcquisitionTask, CoreError, TaskKind};

/// Upper bound on items per request.
pub const MAX_LIMIT: usize = 100;

/// Limit used when the caller sends none or sends garbage.
pub const DEFAULT_LIMIT: usize = 20;

/// Default wall-clock budget for one scraper run.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Longest accepted search query, in characters.
pub const MAX_QUERY_CHARS: usize = 100;

/// Longest accepted show identifier.
const MAX_ID_LEN: usize = 64;

/// Parse a `limit` parameter.
///
/// Positive integers are clamped to `[1, MAX_LIMIT]`. Missing, non-numeric,
/// zero and negative values fall back to [`DEFAULT_LIMIT`].
pub fn parse_limit(raw: Option<&str>) -> usize {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_LIMIT;
    };
    match raw.parse::<u64>() {
        Ok(0) => DEFAULT_LIMIT,
        Ok(n) => n.min(MAX_LIMIT as u64) as usize,
        // All digits but too large for u64.
        Err(_) if raw.bytes().all(|b| b.is_ascii_digit()) => MAX_LIMIT,
        Err(_) => DEFAULT_LIMIT,
    }
}

/// Parse a boolean query flag such as `real=true` or `save=1`.
pub fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validates caller input and produces immutable [`AcquisitionTask`]s.
#[derive(Debug, Clone, Copy)]
pub struct RequestNormalizer {
    timeout_ms: u64,
}

impl RequestNormalizer {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Build a task for `kind` from raw string parameters.
    ///
    /// Only the parameters the kind understands are kept.
    pub fn normalize(
        &self,
        kind: TaskKind,
        params: &HashMap<String, String>,
    ) -> Result<AcquisitionTask, CoreError> {
        let limit = parse_limit(params.get("limit").map(String::as_str));

        let mut parameters = BTreeMap::new();
        parameters.insert("limit".to_string(), limit.to_string());

        match kind {
            TaskKind::Latest => {}
            TaskKind::Search => {
                let query = validate_query(params.get("q").map(String::as_str))?;
                parameters.insert("q".to_string(), query);
            }
            TaskKind::Episodes => {
                let id = validate_id(params.get("id").map(String::as_str))?;
                parameters.insert("id".to_string(), id);
            }
            TaskKind::Video => {
                let url = validate_page_url(params.get("url").map(String::as_str))?;
                parameters.insert("url".to_string(), url);
            }
        }

        Ok(AcquisitionTask::new(kind, parameters, limit, self.timeout_ms))
    }
}

impl Default for RequestNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

fn validate_query(raw: Option<&str>) -> Result<String, CoreError> {
    let query = raw.map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(CoreError::invalid("search query 'q' is required"));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(CoreError::invalid(format!(
            "search query exceeds {MAX_QUERY_CHARS} characters"
        )));
    }
    if query.chars().any(char::is_control) {
        return Err(CoreError::invalid("search query contains control characters"));
    }
    Ok(query.to_string())
}

fn validate_id(raw: Option<&str>) -> Result<String, CoreError> {
    let id = raw.map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(CoreError::invalid("anime id is required"));
    }
    if id.len() > MAX_ID_LEN {
        return Err(CoreError::invalid("anime id is too long"));
    }
    if !id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(CoreError::invalid(format!("malformed anime id: {id}")));
    }
    Ok(id.to_string())
}

fn validate_page_url(raw: Option<&str>) -> Result<String, CoreError> {
    let url = raw.map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(CoreError::invalid("episode page 'url' is required"));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(CoreError::invalid("episode page url must be http(s)"));
    }
    if url.contains("..") || url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CoreError::invalid(format!("malformed episode page url: {url}")));
    }
    Ok(url.to_string())
}
