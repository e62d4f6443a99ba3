//! Server configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anifetch_core::request::DEFAULT_TIMEOUT_MS;
use anifetch_core::{RequestNormalizer, DEFAULT_SOURCE_URL};
use anifetch_scraper::{
    Acquirer, HttpAcquirer, ScraperAcquirer, ScraperExecutor, ScriptLayout, DEFAULT_PROGRAM,
};
use tracing::info;

/// anifetch server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server bind address.
    pub bind_addr: String,

    /// Interpreter that runs the scraper scripts.
    pub program: String,

    /// Directory holding the scraper scripts; also their working directory.
    pub scripts_dir: PathBuf,

    pub scripts: ScriptLayout,

    /// Hard wall-clock limit per acquisition (milliseconds).
    pub timeout_ms: u64,

    /// Maximum scraper children running at once.
    pub max_concurrent_scrapes: usize,

    /// Directory snapshots are written to.
    pub snapshot_dir: PathBuf,

    /// Whether requests without a `real` flag use live data.
    pub live_by_default: bool,

    /// Crawler service used instead of local scripts when set.
    pub crawler_service_url: Option<String>,

    /// Source URL reported when a payload does not name one.
    pub source_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            program: DEFAULT_PROGRAM.to_string(),
            scripts_dir: PathBuf::from("scripts"),
            scripts: ScriptLayout::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_concurrent_scrapes: 4,
            snapshot_dir: PathBuf::from("data"),
            live_by_default: true,
            crawler_service_url: None,
            source_url: DEFAULT_SOURCE_URL.to_string(),
        }
    }
}

impl Config {
    pub fn normalizer(&self) -> RequestNormalizer {
        RequestNormalizer::new(self.timeout_ms)
    }

    /// Build the acquirer this configuration selects.
    pub fn build_acquirer(&self) -> Arc<dyn Acquirer> {
        match &self.crawler_service_url {
            Some(url) => {
                info!(url = %url, "Using crawler service acquirer");
                Arc::new(HttpAcquirer::new(url).with_source_url(&self.source_url))
            }
            None => {
                info!(
                    program = %self.program,
                    scripts_dir = %self.scripts_dir.display(),
                    max_concurrent = self.max_concurrent_scrapes,
                    "Using scraper subprocess acquirer"
                );
                let executor = ScraperExecutor::new(&self.program, &self.scripts_dir)
                    .with_scripts(self.scripts.clone());
                Arc::new(
                    ScraperAcquirer::new(executor, self.max_concurrent_scrapes)
                        .with_source_url(&self.source_url),
                )
            }
        }
    }
}
