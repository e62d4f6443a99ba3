//! Acquisition task types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, TaskId};

/// Site every scraper variant reads from.
pub const DEFAULT_SOURCE_URL: &str = "http://www.iyinghua.com";

/// What the scraper is asked to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Most recently updated shows.
    Latest,
    /// Keyword search results.
    Search,
    /// Episode list of one show.
    Episodes,
    /// Playable video address of one episode page.
    Video,
}

impl TaskKind {
    /// Every kind, in a stable order.
    pub const ALL: [TaskKind; 4] = [Self::Latest, Self::Search, Self::Episodes, Self::Video];

    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Search => "search",
            Self::Episodes => "episodes",
            Self::Video => "video",
        }
    }

    /// Name of the request parameter passed to the scraper as its positional argument.
    pub fn primary_param(&self) -> &'static str {
        match self {
            Self::Latest => "limit",
            Self::Search => "q",
            Self::Episodes => "id",
            Self::Video => "url",
        }
    }

    /// File name prefix used for snapshots of this kind.
    pub fn snapshot_prefix(&self) -> &'static str {
        match self {
            Self::Latest => "latest_updates",
            Self::Search => "search_results",
            Self::Episodes => "episodes",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" | "latest-update" | "latest_update" => Ok(Self::Latest),
            "search" => Ok(Self::Search),
            "episodes" | "anime" => Ok(Self::Episodes),
            "video" | "play" => Ok(Self::Video),
            other => Err(CoreError::UnknownKind(other.to_string())),
        }
    }
}

/// One bounded attempt to fetch structured content from the scraper.
///
/// Built only by [`RequestNormalizer`](crate::RequestNormalizer), so its
/// parameters are always validated. Fields are read-only after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcquisitionTask {
    id: TaskId,
    kind: TaskKind,
    parameters: BTreeMap<String, String>,
    limit: usize,
    timeout_ms: u64,
    created_at: DateTime<Utc>,
}

impl AcquisitionTask {
    pub(crate) fn new(
        kind: TaskKind,
        parameters: BTreeMap<String, String>,
        limit: usize,
        timeout_ms: u64,
    ) -> Self {
        Self {
            id: TaskId::generate(),
            kind,
            parameters,
            limit,
            timeout_ms,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Validated parameters, keyed by request parameter name.
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Look up a single validated parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// The value handed to the scraper as its positional argument.
    pub fn primary_param(&self) -> Option<&str> {
        self.param(self.kind.primary_param())
    }

    /// Maximum number of items the caller receives.
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str_accepts_route_aliases() {
        assert_eq!("latest-update".parse::<TaskKind>().unwrap(), TaskKind::Latest);
        assert_eq!("Search".parse::<TaskKind>().unwrap(), TaskKind::Search);
        assert_eq!("anime".parse::<TaskKind>().unwrap(), TaskKind::Episodes);
        assert_eq!("play".parse::<TaskKind>().unwrap(), TaskKind::Video);
        assert!(matches!(
            "weekly".parse::<TaskKind>(),
            Err(CoreError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_primary_param_lookup() {
        let mut params = BTreeMap::new();
        params.insert("q".to_string(), "牧神记".to_string());
        params.insert("limit".to_string(), "5".to_string());
        let task = AcquisitionTask::new(TaskKind::Search, params, 5, 15_000);

        assert_eq!(task.primary_param(), Some("牧神记"));
        assert_eq!(task.timeout(), Duration::from_millis(15_000));
        assert_eq!(task.limit(), 5);
    }

    #[test]
    fn test_task_serializes_one_way() {
        let mut params = BTreeMap::new();
        params.insert("id".to_string(), "6594".to_string());
        let task = AcquisitionTask::new(TaskKind::Episodes, params, 20, 15_000);

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["kind"], serde_json::to_value(TaskKind::Episodes).unwrap());
        assert_eq!(json["parameters"]["id"], "6594");
        assert_eq!(json["limit"], 20);
    }
}
