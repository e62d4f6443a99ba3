//! anifetch Server Library
//!
//! The fallback & cache layer, snapshot store, metrics and HTTP surface of
//! the acquisition pipeline. The `anifetch` CLI reuses the same pipeline.

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod pipeline;
pub mod snapshot;
pub mod state;

pub use config::Config;
pub use error::SnapshotError;
pub use metrics::Metrics;
pub use pipeline::{DataSource, Pipeline, Resolution, ResolveOptions};
pub use snapshot::{SnapshotInfo, SnapshotStore};
pub use state::AppState;
