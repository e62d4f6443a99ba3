//! Shared application state.
//!
//! Built once at startup and handed to every handler; there is no global
//! mutable state.

use std::sync::Arc;

use anifetch_core::RequestNormalizer;
use anifetch_scraper::Acquirer;

use crate::config::Config;
use crate::metrics::Metrics;
use crate::pipeline::Pipeline;
use crate::snapshot::SnapshotStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,

    /// Turns raw request parameters into validated tasks.
    pub normalizer: RequestNormalizer,

    /// Acquire, fall back and persist.
    pub pipeline: Pipeline,

    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new AppState wrapped in Arc, using the acquirer `config` selects.
    pub fn new(config: Config) -> Arc<Self> {
        let acquirer = config.build_acquirer();
        Self::with_acquirer(config, acquirer)
    }

    /// Create a new AppState around an explicit acquirer.
    pub fn with_acquirer(config: Config, acquirer: Arc<dyn Acquirer>) -> Arc<Self> {
        let metrics = Arc::new(Metrics::new());
        let pipeline = Pipeline::new(
            acquirer,
            SnapshotStore::new(&config.snapshot_dir),
            metrics.clone(),
            &config.source_url,
        );
        Arc::new(Self {
            normalizer: config.normalizer(),
            config,
            pipeline,
            metrics,
        })
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        self.pipeline.snapshots()
    }
}
