//! Response Normalizer: turns a [`RawAcquisitionResult`] into an [`AcquisitionOutcome`].
//!
//! Pure: identical input always yields an identical outcome. The success
//! timestamp comes from the raw result, never from the clock.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::adapter;
use crate::{AcquisitionOutcome, Failure, FailureReason, RawAcquisitionResult, Success};

/// Classify a raw scraper run.
///
/// `default_source_url` is reported when the payload does not name its source.
pub fn normalize(raw: &RawAcquisitionResult, default_source_url: &str) -> AcquisitionOutcome {
    if raw.timed_out {
        return AcquisitionOutcome::failure(
            FailureReason::Timeout,
            "scraper exceeded its timeout and was killed",
        );
    }

    if raw.exit_code != 0 {
        let detail = if raw.stderr.trim().is_empty() {
            format!("scraper exited with code {}", raw.exit_code)
        } else {
            raw.stderr.trim().to_string()
        };
        return AcquisitionOutcome::Failure(
            Failure::new(FailureReason::NonZeroExit, detail).with_exit_code(raw.exit_code),
        );
    }

    normalize_payload(&raw.stdout, default_source_url, raw.finished_at)
}

/// Decode and classify output text that came from a successful run.
pub fn normalize_payload(
    output: &str,
    default_source_url: &str,
    timestamp: DateTime<Utc>,
) -> AcquisitionOutcome {
    let payload: Value = match serde_json::from_str(extract_payload(output)) {
        Ok(payload) => payload,
        Err(e) => {
            return AcquisitionOutcome::Failure(
                Failure::new(
                    FailureReason::ParseError,
                    format!("{e}; raw output: {output}"),
                )
                .with_exit_code(0),
            );
        }
    };

    if payload.get("success").and_then(Value::as_bool) != Some(true) {
        let detail = payload
            .get("error")
            .and_then(Value::as_str)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or("scraper reported failure without an error message");
        return AcquisitionOutcome::Failure(
            Failure::new(FailureReason::NonZeroExit, detail).with_exit_code(0),
        );
    }

    AcquisitionOutcome::Success(Success {
        items: adapter::collect_items(&payload),
        source_url: adapter::source_url(&payload)
            .unwrap_or_else(|| default_source_url.to_string()),
        timestamp,
        title: adapter::collection_title(&payload),
    })
}

/// Skip diagnostic lines printed before the structured payload.
///
/// Returns the text from the first line that starts with `{` or `[` to the
/// end of the stream, or the whole trimmed output when no line does.
pub fn extract_payload(output: &str) -> &str {
    let mut offset = 0;
    for line in output.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            let indent = line.len() - trimmed.len();
            return output[offset + indent..].trim_end();
        }
        offset += line.len();
    }
    output.trim()
}
