//! Acquirers for anifetch
//!
//! An [`Acquirer`] turns an [`AcquisitionTask`](anifetch_core::AcquisitionTask)
//! into an [`AcquisitionOutcome`](anifetch_core::AcquisitionOutcome) and never
//! fails outright. Two variants are provided:
//!
//! - [`ScraperAcquirer`] spawns the scraper scripts as bounded child processes
//! - [`HttpAcquirer`] posts the task to a crawler service
//!
//! # Example
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use anifetch_core::{RequestNormalizer, TaskKind};
//! use anifetch_scraper::{Acquirer, ScraperAcquirer, ScraperExecutor};
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let acquirer = ScraperAcquirer::new(ScraperExecutor::new("python3", "scripts"), 4);
//!     let params = HashMap::from([("limit".to_string(), "10".to_string())]);
//!     let task = RequestNormalizer::default().normalize(TaskKind::Latest, &params)?;
//!
//!     let outcome = acquirer.acquire(&task).await;
//!     println!("success: {}", outcome.is_success());
//!     Ok(())
//! }
//! ```

mod acquirer;
mod error;
mod executor;
mod http;

pub use acquirer::{preview, Acquirer, ScraperAcquirer, LOG_PREVIEW_CHARS};
pub use error::ScraperError;
pub use executor::{ScraperExecutor, ScriptLayout, DEFAULT_PROGRAM};
pub use http::HttpAcquirer;
