//! Persisted copy of a successful acquisition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CanonicalItem, Success, TaskKind};

/// On-disk layout: `{ data, total_count, timestamp, source_url }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub data: Vec<CanonicalItem>,
    pub total_count: usize,
    pub timestamp: DateTime<Utc>,
    pub source_url: String,
}

impl Snapshot {
    pub fn from_success(success: &Success) -> Self {
        Self {
            data: success.items.clone(),
            total_count: success.items.len(),
            timestamp: success.timestamp,
            source_url: success.source_url.clone(),
        }
    }

    /// Whether this snapshot holds exactly the items, source and time of `success`.
    pub fn matches(&self, success: &Success) -> bool {
        self.data == success.items
            && self.total_count == success.items.len()
            && self.timestamp == success.timestamp
            && self.source_url == success.source_url
    }

    /// File name keyed by date, millisecond clock and a uniqueness token.
    pub fn file_name(kind: TaskKind, at: DateTime<Utc>, token: &str) -> String {
        format!(
            "{}_{}_{}_{}.json",
            kind.snapshot_prefix(),
            at.format("%Y-%m-%d"),
            at.timestamp_millis(),
            token
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_embeds_date_and_token() {
        let at = Utc.with_ymd_and_hms(2025, 7, 1, 8, 30, 0).unwrap();
        let name = Snapshot::file_name(TaskKind::Latest, at, "a1b2c3d4");
        assert_eq!(name, format!("latest_updates_2025-07-01_{}_a1b2c3d4.json", at.timestamp_millis()));
    }

    #[test]
    fn test_json_round_trip_matches_success() {
        let success = Success {
            items: vec![CanonicalItem::new("魔天记")
                .with_episode_info("更新至15集")
                .with_current_episode(15)],
            source_url: "http://www.iyinghua.com".to_string(),
            timestamp: Utc::now(),
            title: None,
        };
        let json = serde_json::to_string_pretty(&Snapshot::from_success(&success)).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();

        assert!(back.matches(&success));
        assert_eq!(back.total_count, 1);
    }
}
