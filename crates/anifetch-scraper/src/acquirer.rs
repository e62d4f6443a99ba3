//! The `Acquirer` capability and its subprocess-backed variant.

use std::sync::Arc;
use std::time::Instant;

use anifetch_core::{
    normalize, AcquisitionOutcome, AcquisitionTask, Failure, FailureReason, RawAcquisitionResult,
    DEFAULT_SOURCE_URL,
};
use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::executor::ScraperExecutor;

/// Longest slice of raw output written to logs.
pub const LOG_PREVIEW_CHARS: usize = 2000;

/// Fetches structured content for one task.
///
/// Implementations never fail: every problem is classified into
/// [`AcquisitionOutcome::Failure`].
#[async_trait]
pub trait Acquirer: Send + Sync {
    async fn acquire(&self, task: &AcquisitionTask) -> AcquisitionOutcome;

    /// Short label for logs and metrics.
    fn name(&self) -> &'static str;
}

/// Acquirer that runs the scraper scripts as child processes.
///
/// At most `max_concurrent` children run at once. Time spent waiting for a
/// slot counts against the task's timeout.
#[derive(Debug, Clone)]
pub struct ScraperAcquirer {
    executor: ScraperExecutor,
    permits: Arc<Semaphore>,
    source_url: String,
}

impl ScraperAcquirer {
    pub fn new(executor: ScraperExecutor, max_concurrent: usize) -> Self {
        Self {
            executor,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            source_url: DEFAULT_SOURCE_URL.to_string(),
        }
    }

    /// Source URL reported when a payload does not name its own.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    /// Free scraper slots right now.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl Acquirer for ScraperAcquirer {
    async fn acquire(&self, task: &AcquisitionTask) -> AcquisitionOutcome {
        let started = Instant::now();
        let deadline = started + task.timeout();

        let permit = match tokio::time::timeout(task.timeout(), self.permits.acquire()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => {
                return AcquisitionOutcome::failure(
                    FailureReason::SpawnError,
                    "scraper pool is closed",
                );
            }
            Err(_) => {
                warn!(
                    task_id = %task.id(),
                    kind = %task.kind(),
                    "Timed out waiting for a scraper slot"
                );
                return AcquisitionOutcome::failure(
                    FailureReason::Timeout,
                    "timed out waiting for a free scraper slot",
                );
            }
        };

        let budget = deadline.saturating_duration_since(Instant::now());
        let result = self.executor.invoke_within(task, budget).await;
        drop(permit);

        let outcome = match result {
            Ok(raw) => {
                let outcome = normalize(&raw, &self.source_url);
                log_outcome(task, &raw, &outcome);
                outcome
            }
            Err(e) => {
                warn!(task_id = %task.id(), kind = %task.kind(), error = %e, "Scraper invocation failed");
                AcquisitionOutcome::Failure(Failure::new(FailureReason::SpawnError, e.to_string()))
            }
        };

        info!(
            task_id = %task.id(),
            kind = %task.kind(),
            success = outcome.is_success(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Acquisition finished"
        );
        outcome
    }

    fn name(&self) -> &'static str {
        "scraper"
    }
}

fn log_outcome(task: &AcquisitionTask, raw: &RawAcquisitionResult, outcome: &AcquisitionOutcome) {
    let AcquisitionOutcome::Failure(failure) = outcome else {
        return;
    };
    warn!(
        task_id = %task.id(),
        kind = %task.kind(),
        reason = failure.reason.as_str(),
        exit_code = raw.exit_code,
        stdout = %preview(&raw.stdout, LOG_PREVIEW_CHARS),
        stderr = %preview(&raw.stderr, LOG_PREVIEW_CHARS),
        "Scraper output rejected"
    );
}

/// At most `max_chars` characters of `text`, marked when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
