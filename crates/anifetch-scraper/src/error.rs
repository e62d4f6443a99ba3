//! Error types for scraper invocation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop an acquisition before any output can be classified.
#[derive(Debug, Error)]
pub enum ScraperError {
    /// The scraper program could not be started.
    #[error("failed to spawn scraper '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the child's output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Crawler service request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The script for this task kind does not exist.
    #[error("scraper script not found at {}", .0.display())]
    MissingScript(PathBuf),
}
