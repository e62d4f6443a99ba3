//! Prometheus metrics collection and formatting.
//!
//! This module provides metrics in Prometheus text exposition format.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use anifetch_core::{FailureReason, TaskKind};

use crate::pipeline::DataSource;

/// Process-wide pipeline counters.
#[derive(Debug, Default)]
pub struct Metrics {
    resolutions: [[AtomicU64; 3]; 4],
    failures: [AtomicU64; 4],
    invalid_requests: AtomicU64,
    snapshots_written: AtomicU64,
    snapshot_errors: AtomicU64,
}

fn kind_index(kind: TaskKind) -> usize {
    TaskKind::ALL.iter().position(|k| *k == kind).unwrap_or(0)
}

fn source_index(source: DataSource) -> usize {
    DataSource::ALL.iter().position(|s| *s == source).unwrap_or(0)
}

fn reason_index(reason: FailureReason) -> usize {
    FailureReason::ALL.iter().position(|r| *r == reason).unwrap_or(0)
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_resolution(&self, kind: TaskKind, source: DataSource) {
        self.resolutions[kind_index(kind)][source_index(source)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, reason: FailureReason) {
        self.failures[reason_index(reason)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_request(&self) {
        self.invalid_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot(&self, written: bool) {
        let counter = if written {
            &self.snapshots_written
        } else {
            &self.snapshot_errors
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn resolutions(&self, kind: TaskKind, source: DataSource) -> u64 {
        self.resolutions[kind_index(kind)][source_index(source)].load(Ordering::Relaxed)
    }

    pub fn failures(&self, reason: FailureReason) -> u64 {
        self.failures[reason_index(reason)].load(Ordering::Relaxed)
    }
}

/// Format all counters as Prometheus text.
pub fn collect_metrics(metrics: &Metrics) -> String {
    let mut output = String::new();

    collect_resolution_metrics(metrics, &mut output);
    collect_failure_metrics(metrics, &mut output);
    collect_misc_metrics(metrics, &mut output);

    output
}

fn collect_resolution_metrics(metrics: &Metrics, output: &mut String) {
    writeln!(
        output,
        "# HELP anifetch_resolutions_total Resolved requests by task kind and data source"
    )
    .ok();
    writeln!(output, "# TYPE anifetch_resolutions_total counter").ok();
    for kind in TaskKind::ALL {
        for source in DataSource::ALL {
            writeln!(
                output,
                "anifetch_resolutions_total{{kind=\"{}\",source=\"{}\"}} {}",
                kind.as_str(),
                source.as_str(),
                metrics.resolutions(kind, source)
            )
            .ok();
        }
    }
}

fn collect_failure_metrics(metrics: &Metrics, output: &mut String) {
    writeln!(output).ok();
    writeln!(
        output,
        "# HELP anifetch_acquisition_failures_total Failed acquisitions by reason"
    )
    .ok();
    writeln!(output, "# TYPE anifetch_acquisition_failures_total counter").ok();
    for reason in FailureReason::ALL {
        writeln!(
            output,
            "anifetch_acquisition_failures_total{{reason=\"{}\"}} {}",
            reason.as_str(),
            metrics.failures(reason)
        )
        .ok();
    }
}

fn collect_misc_metrics(metrics: &Metrics, output: &mut String) {
    let invalid = metrics.invalid_requests.load(Ordering::Relaxed);
    let written = metrics.snapshots_written.load(Ordering::Relaxed);
    let errors = metrics.snapshot_errors.load(Ordering::Relaxed);

    writeln!(output).ok();
    writeln!(output, "# HELP anifetch_invalid_requests_total Requests rejected by validation").ok();
    writeln!(output, "# TYPE anifetch_invalid_requests_total counter").ok();
    writeln!(output, "anifetch_invalid_requests_total {invalid}").ok();

    writeln!(output).ok();
    writeln!(output, "# HELP anifetch_snapshots_total Snapshot writes by result").ok();
    writeln!(output, "# TYPE anifetch_snapshots_total counter").ok();
    writeln!(output, "anifetch_snapshots_total{{result=\"written\"}} {written}").ok();
    writeln!(output, "anifetch_snapshots_total{{result=\"error\"}} {errors}").ok();
}
