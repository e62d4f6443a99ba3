//! Canonical content entry.

use serde::{Deserialize, Serialize};

/// Placeholder title for entries the scraper returned without one.
pub const UNKNOWN_TITLE: &str = "未知标题";

/// Normalized, schema-complete representation of one anime, episode or video.
///
/// Every field is always present on the wire; optional values serialize as
/// `null` so consumers never branch on key presence. `title` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalItem {
    /// Display title. Falls back to [`UNKNOWN_TITLE`].
    pub title: String,

    /// Cover image URL.
    #[serde(default)]
    pub cover_image: Option<String>,

    /// Detail, episode or video URL depending on the task kind.
    #[serde(default)]
    pub detail_url: Option<String>,

    /// Free-form episode text such as `更新至12集`.
    #[serde(default)]
    pub episode_info: Option<String>,

    /// Current or listed episode number.
    #[serde(default)]
    pub current_episode: Option<u32>,
}

impl CanonicalItem {
    /// Create an item with only a title. Blank titles become [`UNKNOWN_TITLE`].
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let title = match title.trim() {
            "" => UNKNOWN_TITLE.to_string(),
            trimmed if trimmed.len() == title.len() => title,
            trimmed => trimmed.to_string(),
        };
        Self {
            title,
            cover_image: None,
            detail_url: None,
            episode_info: None,
            current_episode: None,
        }
    }

    pub fn with_cover_image(mut self, url: impl Into<String>) -> Self {
        self.cover_image = non_blank(url.into());
        self
    }

    pub fn with_detail_url(mut self, url: impl Into<String>) -> Self {
        self.detail_url = non_blank(url.into());
        self
    }

    pub fn with_episode_info(mut self, info: impl Into<String>) -> Self {
        self.episode_info = non_blank(info.into());
        self
    }

    pub fn with_current_episode(mut self, episode: u32) -> Self {
        self.current_episode = Some(episode);
        self
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
