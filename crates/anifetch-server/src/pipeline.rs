//! Fallback & cache layer.
//!
//! Decides what a caller receives for a task: live items (optionally
//! persisted as a snapshot) when acquisition succeeds, seed items otherwise.
//! Acquisition failures never escape this layer.

use std::path::PathBuf;
use std::sync::Arc;

use anifetch_core::{
    AcquisitionOutcome, AcquisitionTask, CanonicalItem, Failure, SeedCatalog, Success, TaskId,
    TaskKind, TaskLifecycle, TaskPhase,
};
use anifetch_scraper::Acquirer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::Metrics;
use crate::snapshot::SnapshotStore;

/// Where the items of a resolution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Acquired just now.
    Live,
    /// Seed data substituted after a failed acquisition.
    Fallback,
    /// Seed data requested explicitly.
    Seed,
}

impl DataSource {
    pub const ALL: [DataSource; 3] = [Self::Live, Self::Fallback, Self::Seed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Fallback => "fallback",
            Self::Seed => "seed",
        }
    }
}

/// Per-request switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Invoke the acquirer; when false seed data is served directly.
    pub live: bool,

    /// Write a snapshot of successful live results.
    pub persist: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            live: true,
            persist: false,
        }
    }
}

/// What the caller receives for one task.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub task_id: TaskId,
    pub kind: TaskKind,
    pub items: Vec<CanonicalItem>,
    pub source_url: String,
    pub timestamp: DateTime<Utc>,
    pub title: Option<String>,
    pub data_source: DataSource,
    pub snapshot_path: Option<PathBuf>,
    /// Why live acquisition failed; kept for logs, never shown to end users.
    pub failure: Option<Failure>,
    /// Lifecycle of the live acquisition; empty when no acquisition ran.
    pub phases: Vec<TaskPhase>,
}

impl Resolution {
    /// True when seed data stands in for a failed acquisition.
    pub fn degraded(&self) -> bool {
        self.data_source == DataSource::Fallback
    }

    pub fn total_count(&self) -> usize {
        self.items.len()
    }
}

/// Runs tasks through the acquirer and applies the fallback policy.
pub struct Pipeline {
    acquirer: Arc<dyn Acquirer>,
    seeds: SeedCatalog,
    snapshots: SnapshotStore,
    metrics: Arc<Metrics>,
    source_url: String,
}

impl Pipeline {
    pub fn new(
        acquirer: Arc<dyn Acquirer>,
        snapshots: SnapshotStore,
        metrics: Arc<Metrics>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            acquirer,
            seeds: SeedCatalog,
            snapshots,
            metrics,
            source_url: source_url.into(),
        }
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Resolve `task` to something renderable. Never fails.
    pub async fn resolve(&self, task: &AcquisitionTask, options: ResolveOptions) -> Resolution {
        if !options.live {
            debug!(task_id = %task.id(), kind = %task.kind(), "Serving seed data");
            let items = self.seeds.items_for(task);
            return self.finish(task, Vec::new(), items, DataSource::Seed, None, None, None);
        }

        let mut lifecycle = TaskLifecycle::new(task.id().clone());
        self.transition(&mut lifecycle, TaskPhase::Invoking);
        info!(
            task_id = %task.id(),
            kind = %task.kind(),
            acquirer = self.acquirer.name(),
            "Acquiring"
        );
        let outcome = self.acquirer.acquire(task).await;
        self.apply(task, lifecycle, outcome, options).await
    }

    /// Apply the fallback policy to an outcome produced for `task`.
    async fn apply(
        &self,
        task: &AcquisitionTask,
        mut lifecycle: TaskLifecycle,
        outcome: AcquisitionOutcome,
        options: ResolveOptions,
    ) -> Resolution {
        if let Err(e) = lifecycle.settle(&outcome) {
            warn!(task_id = %task.id(), error = %e, "Lifecycle out of order");
        }
        self.transition(&mut lifecycle, TaskPhase::Resolved);

        match outcome {
            AcquisitionOutcome::Success(mut success) => {
                success.truncate(task.limit());
                let snapshot_path = if options.persist {
                    self.persist(task.kind(), &success).await
                } else {
                    None
                };
                let Success {
                    items,
                    source_url,
                    timestamp,
                    title,
                } = success;
                let mut resolution = self.finish(
                    task,
                    lifecycle.history().to_vec(),
                    items,
                    DataSource::Live,
                    snapshot_path,
                    title,
                    None,
                );
                resolution.source_url = source_url;
                resolution.timestamp = timestamp;
                resolution
            }
            AcquisitionOutcome::Failure(failure) => {
                warn!(
                    task_id = %task.id(),
                    kind = %task.kind(),
                    reason = failure.reason.as_str(),
                    detail = %failure.detail,
                    "Acquisition failed, serving fallback data"
                );
                self.metrics.record_failure(failure.reason);
                let items = self.seeds.items_for(task);
                self.finish(
                    task,
                    lifecycle.history().to_vec(),
                    items,
                    DataSource::Fallback,
                    None,
                    None,
                    Some(failure),
                )
            }
        }
    }

    /// Best-effort snapshot write; errors are logged and swallowed.
    async fn persist(&self, kind: TaskKind, success: &Success) -> Option<PathBuf> {
        match self.snapshots.write(kind, success).await {
            Ok(path) => {
                self.metrics.record_snapshot(true);
                Some(path)
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "Snapshot write failed");
                self.metrics.record_snapshot(false);
                None
            }
        }
    }

    fn transition(&self, lifecycle: &mut TaskLifecycle, next: TaskPhase) {
        if let Err(e) = lifecycle.advance(next) {
            warn!(task_id = %lifecycle.task_id(), error = %e, "Lifecycle out of order");
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        task: &AcquisitionTask,
        phases: Vec<TaskPhase>,
        items: Vec<CanonicalItem>,
        data_source: DataSource,
        snapshot_path: Option<PathBuf>,
        title: Option<String>,
        failure: Option<Failure>,
    ) -> Resolution {
        self.metrics.record_resolution(task.kind(), data_source);
        info!(
            task_id = %task.id(),
            kind = %task.kind(),
            source = data_source.as_str(),
            items = items.len(),
            "Resolved"
        );
        Resolution {
            task_id: task.id().clone(),
            kind: task.kind(),
            items,
            source_url: self.source_url.clone(),
            timestamp: Utc::now(),
            title,
            data_source,
            snapshot_path,
            failure,
            phases,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anifetch_core::{normalize, FailureReason, RawAcquisitionResult, RequestNormalizer};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Acquirer that replays a fixed raw scraper result.
    pub(crate) struct StubAcquirer {
        raw: RawAcquisitionResult,
        pub(crate) calls: AtomicUsize,
    }

    impl StubAcquirer {
        pub(crate) fn new(raw: RawAcquisitionResult) -> Self {
            Self {
                raw,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn ok(stdout: &str) -> Self {
            Self::new(RawAcquisitionResult::completed(0, stdout, ""))
        }
    }

    #[async_trait]
    impl Acquirer for StubAcquirer {
        async fn acquire(&self, _task: &AcquisitionTask) -> AcquisitionOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            normalize(&self.raw, "http://www.iyinghua.com")
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    fn pipeline(acquirer: Arc<StubAcquirer>, dir: &std::path::Path) -> Pipeline {
        Pipeline::new(
            acquirer,
            SnapshotStore::new(dir),
            Arc::new(Metrics::new()),
            "http://www.iyinghua.com",
        )
    }

    fn latest(limit: &str) -> AcquisitionTask {
        let params = HashMap::from([("limit".to_string(), limit.to_string())]);
        RequestNormalizer::default()
            .normalize(TaskKind::Latest, &params)
            .unwrap()
    }

    fn many(n: usize) -> String {
        let items: Vec<_> = (0..n)
            .map(|i| serde_json::json!({ "title": format!("t{i}") }))
            .collect();
        serde_json::json!({ "success": true, "data": items }).to_string()
    }

    #[tokio::test]
    async fn test_success_is_truncated_to_limit() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(Arc::new(StubAcquirer::ok(&many(30))), dir.path());

        let resolution = pipeline.resolve(&latest("5"), ResolveOptions::default()).await;
        assert_eq!(resolution.total_count(), 5);
        assert_eq!(resolution.items[0].title, "t0");
        assert_eq!(resolution.data_source, DataSource::Live);
        assert!(!resolution.degraded());
        assert_eq!(
            resolution.phases,
            [
                TaskPhase::Created,
                TaskPhase::Invoking,
                TaskPhase::Parsing,
                TaskPhase::Normalized,
                TaskPhase::Resolved
            ]
        );
    }

    #[tokio::test]
    async fn test_count_never_exceeds_available() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(Arc::new(StubAcquirer::ok(&many(3))), dir.path());

        let resolution = pipeline.resolve(&latest("50"), ResolveOptions::default()).await;
        assert_eq!(resolution.total_count(), 3);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_seed() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubAcquirer::new(RawAcquisitionResult::completed(1, "", "network error"));
        let pipeline = pipeline(Arc::new(stub), dir.path());

        let resolution = pipeline.resolve(&latest("3"), ResolveOptions::default()).await;
        assert!(resolution.degraded());
        assert_eq!(resolution.total_count(), 3);
        assert_eq!(resolution.items, SeedCatalog::latest()[..3]);
        let failure = resolution.failure.unwrap();
        assert_eq!(failure.reason, FailureReason::NonZeroExit);
        assert_eq!(resolution.phases.last(), Some(&TaskPhase::Resolved));
        assert_eq!(
            pipeline.metrics().failures(FailureReason::NonZeroExit),
            1
        );
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_seed() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(
            Arc::new(StubAcquirer::new(RawAcquisitionResult::timed_out())),
            dir.path(),
        );

        let resolution = pipeline.resolve(&latest("20"), ResolveOptions::default()).await;
        assert!(resolution.degraded());
        assert_eq!(resolution.total_count(), SeedCatalog::latest().len());
        assert!(resolution.phases.contains(&TaskPhase::TimedOut));
    }

    #[tokio::test]
    async fn test_seed_only_skips_acquirer() {
        let dir = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubAcquirer::ok(&many(3)));
        let pipeline = pipeline(stub.clone(), dir.path());

        let options = ResolveOptions {
            live: false,
            persist: true,
        };
        let resolution = pipeline.resolve(&latest("2"), options).await;
        assert_eq!(resolution.data_source, DataSource::Seed);
        assert!(!resolution.degraded());
        assert!(resolution.snapshot_path.is_none());
        assert!(resolution.phases.is_empty());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_persisted_snapshot_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(Arc::new(StubAcquirer::ok(&many(4))), dir.path());

        let options = ResolveOptions {
            live: true,
            persist: true,
        };
        let resolution = pipeline.resolve(&latest("2"), options).await;
        let path = resolution.snapshot_path.clone().unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();

        let snapshot = pipeline.snapshots().read(name).await.unwrap();
        assert_eq!(snapshot.data, resolution.items);
        assert_eq!(snapshot.total_count, 2);
        assert_eq!(snapshot.source_url, resolution.source_url);
        assert_eq!(snapshot.timestamp, resolution.timestamp);
    }

    #[tokio::test]
    async fn test_snapshot_failure_keeps_success() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let pipeline = pipeline(Arc::new(StubAcquirer::ok(&many(2))), &blocker);

        let options = ResolveOptions {
            live: true,
            persist: true,
        };
        let resolution = pipeline.resolve(&latest("20"), options).await;
        assert_eq!(resolution.data_source, DataSource::Live);
        assert!(resolution.snapshot_path.is_none());
    }
}
