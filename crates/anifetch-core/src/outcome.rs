//! Raw scraper output and the classified outcome that crosses the pipeline boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CanonicalItem;

/// Everything captured from one scraper invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAcquisitionResult {
    /// Process exit code. `-1` when the child was terminated by a signal.
    pub exit_code: i32,

    /// Captured standard output, decoded as UTF-8.
    pub stdout: String,

    /// Captured standard error, decoded as UTF-8.
    pub stderr: String,

    /// Whether the child was killed for exceeding its timeout.
    pub timed_out: bool,

    /// When the invocation ended. Stamped onto successful outcomes.
    pub finished_at: DateTime<Utc>,
}

impl RawAcquisitionResult {
    /// A child that ran to completion.
    pub fn completed(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
            finished_at: Utc::now(),
        }
    }

    /// A child that was killed at its deadline. Partial output is discarded.
    pub fn timed_out() -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: true,
            finished_at: Utc::now(),
        }
    }

    /// Override the completion time (useful for testing).
    pub fn with_finished_at(mut self, at: DateTime<Utc>) -> Self {
        self.finished_at = at;
        self
    }
}

/// Why an acquisition failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The child exceeded its wall-clock budget and was killed.
    Timeout,
    /// The child exited non-zero, or exited zero but reported `success: false`.
    NonZeroExit,
    /// The child's output held no decodable payload.
    ParseError,
    /// The child could not be started at all.
    SpawnError,
}

impl FailureReason {
    pub const ALL: [FailureReason; 4] = [
        Self::Timeout,
        Self::NonZeroExit,
        Self::ParseError,
        Self::SpawnError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::NonZeroExit => "non_zero_exit",
            Self::ParseError => "parse_error",
            Self::SpawnError => "spawn_error",
        }
    }
}

/// Classified failure with enough detail to diagnose a broken scraper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub reason: FailureReason,

    /// Stderr, raw stdout or error message, never truncated.
    pub detail: String,

    /// Exit code of the child when one was observed.
    pub exit_code: Option<i32>,
}

impl Failure {
    pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
            exit_code: None,
        }
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// True when the process succeeded but its payload declared a logical failure.
    pub fn is_reported_by_scraper(&self) -> bool {
        self.reason == FailureReason::NonZeroExit && self.exit_code == Some(0)
    }
}

/// Normalized items from a successful acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Success {
    /// Items in exactly the order the scraper returned them.
    pub items: Vec<CanonicalItem>,

    /// Page the scraper read from.
    pub source_url: String,

    pub timestamp: DateTime<Utc>,

    /// Title of the show the items belong to (episode lists).
    pub title: Option<String>,
}

impl Success {
    /// Keep at most `limit` items, preserving order.
    pub fn truncate(&mut self, limit: usize) {
        self.items.truncate(limit);
    }
}

/// The only value that leaves an acquirer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AcquisitionOutcome {
    Success(Success),
    Failure(Failure),
}

impl AcquisitionOutcome {
    pub fn failure(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self::Failure(Failure::new(reason, detail))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure reason, if this outcome failed.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_failure_is_distinguished_from_exit_failure() {
        let reported = Failure::new(FailureReason::NonZeroExit, "site down").with_exit_code(0);
        let crashed = Failure::new(FailureReason::NonZeroExit, "boom").with_exit_code(1);

        assert!(reported.is_reported_by_scraper());
        assert!(!crashed.is_reported_by_scraper());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = AcquisitionOutcome::failure(FailureReason::Timeout, "killed");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["reason"], "timeout");
        assert_eq!(outcome.failure_reason(), Some(FailureReason::Timeout));
    }

    #[test]
    fn test_success_truncate_preserves_order() {
        let mut success = Success {
            items: vec![
                CanonicalItem::new("a"),
                CanonicalItem::new("b"),
                CanonicalItem::new("c"),
            ],
            source_url: String::new(),
            timestamp: Utc::now(),
            title: None,
        };
        success.truncate(2);
        let titles: Vec<_> = success.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["a", "b"]);
    }
}
