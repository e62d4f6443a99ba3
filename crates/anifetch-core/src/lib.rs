//! anifetch Core Domain Types
//!
//! This crate contains the pure parts of the acquisition pipeline, with no
//! dependencies on:
//! - Child processes
//! - Network clients
//! - Async runtimes
//!
//! The Request Normalizer and the Response Normalizer live here because both
//! are pure functions over their inputs.

pub mod adapter;
pub mod error;
pub mod ids;
pub mod item;
pub mod normalize;
pub mod outcome;
pub mod request;
pub mod seed;
pub mod snapshot;
pub mod status;
pub mod task;
pub mod video;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::TaskId;
pub use item::{CanonicalItem, UNKNOWN_TITLE};
pub use normalize::{extract_payload, normalize, normalize_payload};
pub use outcome::{AcquisitionOutcome, Failure, FailureReason, RawAcquisitionResult, Success};
pub use request::{parse_flag, parse_limit, RequestNormalizer, DEFAULT_LIMIT, MAX_LIMIT};
pub use seed::SeedCatalog;
pub use snapshot::Snapshot;
pub use status::{TaskLifecycle, TaskPhase};
pub use task::{AcquisitionTask, TaskKind, DEFAULT_SOURCE_URL};
