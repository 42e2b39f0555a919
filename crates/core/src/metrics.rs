//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Stream requests (outcome, duration)
//! - Debrid resolution (per-candidate outcome, polling)
//! - Indexers (records returned, failures)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Stream requests
// =============================================================================

/// Stream requests total by result.
pub static STREAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rdflix_stream_requests_total", "Total stream requests"),
        &["result"], // "streams", "empty", "cached", "timeout", "unconfigured"
    )
    .unwrap()
});

/// Pipeline duration in seconds (gather + rank + resolve).
pub static PIPELINE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "rdflix_pipeline_duration_seconds",
            "Duration of a stream pipeline run",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["kind"], // "movie", "series"
    )
    .unwrap()
});

// =============================================================================
// Debrid
// =============================================================================

/// Resolution attempts by outcome.
pub static RESOLVE_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "rdflix_resolve_attempts_total",
            "Total candidate resolution attempts",
        ),
        &["outcome"], // "resolved", "submit_rejected", "files_not_ready", ...
    )
    .unwrap()
});

/// Debrid status polls by phase.
pub static DEBRID_POLLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rdflix_debrid_polls_total", "Total debrid status polls"),
        &["phase"], // "files", "links"
    )
    .unwrap()
});

// =============================================================================
// Indexers
// =============================================================================

/// Records returned by indexers.
pub static INDEXER_RESULTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "rdflix_indexer_results_total",
            "Total torrent records returned by indexers",
        ),
        &["indexer", "result"], // result: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(STREAM_REQUESTS.clone()),
        Box::new(PIPELINE_DURATION.clone()),
        Box::new(RESOLVE_ATTEMPTS.clone()),
        Box::new(DEBRID_POLLS.clone()),
        Box::new(INDEXER_RESULTS.clone()),
    ]
}
