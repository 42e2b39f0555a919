//! Prometheus metrics for observability.
//!
//! This module provides the HTTP request metrics recorded by the metrics
//! middleware and a registry that also carries the core pipeline metrics.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "rdflix_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rdflix_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "rdflix_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Requests rejected by the per-client rate limit.
pub static RATE_LIMITED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "rdflix_rate_limited_total",
        "Requests rejected by the per-client rate limit",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(RATE_LIMITED_TOTAL.clone()))
        .unwrap();

    // Core metrics (stream requests, debrid, indexers)
    for metric in rdflix_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

static STREAM_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/stream/([^/]+)/[^/]+(?:/[^/]+)?$").unwrap());
static HASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9a-fA-F]{40}").unwrap());
static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
///
/// Stream paths keep their media type and lose the title id, so label
/// cardinality stays bounded.
pub fn normalize_path(path: &str) -> String {
    if let Some(caps) = STREAM_PATH.captures(path) {
        let kind = match &caps[1] {
            "movie" | "series" => &caps[1],
            _ => "{type}",
        };
        return format!("/stream/{}/{{id}}", kind);
    }

    let result = HASH.replace_all(path, "{hash}");
    let result = NUMERIC.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_stream_paths() {
        assert_eq!(
            normalize_path("/stream/movie/tt0111161.json"),
            "/stream/movie/{id}"
        );
        assert_eq!(
            normalize_path("/stream/series/tt0944947:1:2.json"),
            "/stream/series/{id}"
        );
        assert_eq!(
            normalize_path("/stream/series/tt0944947:1:2/extra.json"),
            "/stream/series/{id}"
        );
        assert_eq!(normalize_path("/stream/tv/tt1.json"), "/stream/{type}/{id}");
    }

    #[test]
    fn test_normalize_path_hash() {
        let path = "/debug/a94a8fe5ccb19ba61c4c0873d391e987982fbbd3";
        assert_eq!(normalize_path(path), "/debug/{hash}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/api/v1/things/12345"), "/api/v1/things/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(normalize_path("/manifest.json"), "/manifest.json");
    }

    #[test]
    fn test_registry_contains_http_and_core_metrics() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        rdflix_core::metrics::STREAM_REQUESTS
            .with_label_values(&["empty"])
            .inc();

        let output = encode_metrics();

        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
        assert!(output.contains("rdflix_http_requests_total"));
        assert!(output.contains("rdflix_http_request_duration_seconds"));
        assert!(output.contains("rdflix_http_requests_in_flight"));
        assert!(output.contains("rdflix_stream_requests_total"));
    }
}
