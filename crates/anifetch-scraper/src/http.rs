//! Network acquirer that asks a crawler service instead of spawning scripts.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use anifetch_core::{
    normalize_payload, AcquisitionOutcome, AcquisitionTask, Failure, FailureReason, TaskKind,
    DEFAULT_SOURCE_URL,
};
use async_trait::async_trait;

use crate::acquirer::{preview, Acquirer, LOG_PREVIEW_CHARS};
use crate::error::ScraperError;

/// Body posted to the crawler service.
#[derive(Debug, Serialize)]
struct CrawlRequest<'a> {
    kind: TaskKind,
    params: &'a BTreeMap<String, String>,
}

/// Acquirer backed by a crawler HTTP service.
///
/// The service answers with the same payload a scraper script prints.
#[derive(Debug, Clone)]
pub struct HttpAcquirer {
    inner: reqwest::Client,
    endpoint: String,
    source_url: String,
}

impl HttpAcquirer {
    pub fn new(endpoint: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    async fn post(&self, task: &AcquisitionTask) -> Result<(reqwest::StatusCode, String), ScraperError> {
        debug!(url = %self.endpoint, task_id = %task.id(), "POST crawl request");

        let response = self
            .inner
            .post(&self.endpoint)
            .json(&CrawlRequest {
                kind: task.kind(),
                params: task.parameters(),
            })
            .timeout(task.timeout())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl Acquirer for HttpAcquirer {
    async fn acquire(&self, task: &AcquisitionTask) -> AcquisitionOutcome {
        let (status, body) = match self.post(task).await {
            Ok(reply) => reply,
            Err(ScraperError::Http(e)) if e.is_timeout() => {
                warn!(task_id = %task.id(), url = %self.endpoint, "Crawler service timed out");
                return AcquisitionOutcome::failure(FailureReason::Timeout, e.to_string());
            }
            Err(e) => {
                warn!(task_id = %task.id(), url = %self.endpoint, error = %e, "Crawler service unreachable");
                return AcquisitionOutcome::failure(FailureReason::SpawnError, e.to_string());
            }
        };

        if !status.is_success() {
            warn!(
                task_id = %task.id(),
                status = status.as_u16(),
                body = %preview(&body, LOG_PREVIEW_CHARS),
                "Crawler service returned an error"
            );
            return AcquisitionOutcome::Failure(
                Failure::new(FailureReason::NonZeroExit, format!("HTTP {status}: {}", body.trim()))
                    .with_exit_code(i32::from(status.as_u16())),
            );
        }

        let outcome = normalize_payload(&body, &self.source_url, Utc::now());
        if let AcquisitionOutcome::Failure(failure) = &outcome {
            warn!(
                task_id = %task.id(),
                reason = failure.reason.as_str(),
                body = %preview(&body, LOG_PREVIEW_CHARS),
                "Crawler service payload rejected"
            );
        }
        outcome
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
