//! Server error types.

use thiserror::Error;

/// Errors from reading or writing snapshot files.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot not found: {0}")]
    NotFound(String),

    #[error("invalid snapshot name: {0}")]
    InvalidName(String),
}
