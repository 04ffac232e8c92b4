//! Metrics and observability utilities
//!
//! Counters and histograms recorded through the `metrics` facade. The
//! gateway installs the Prometheus recorder; without one these calls are
//! no-ops.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all KitchenBuddy metrics
pub const METRICS_PREFIX: &str = "kitchenbuddy";

/// Buckets for extraction and ingestion latency (in seconds).
/// Backoff alone can add up to 7s on top of the model call.
pub const EXTRACTION_BUCKETS: &[f64] = &[
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.000, // 2s
    5.000, // 5s
    10.00, // 10s
    20.00, // 20s
    45.00, // 45s - client timeout
    60.00, // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Extraction metrics
    describe_counter!(
        format!("{}_extraction_attempts_total", METRICS_PREFIX),
        Unit::Count,
        "Extraction service calls by outcome"
    );

    describe_counter!(
        format!("{}_extraction_rate_limit_retries_total", METRICS_PREFIX),
        Unit::Count,
        "Backoffs taken after a rate-limited extraction call"
    );

    // Ingestion metrics
    describe_counter!(
        format!("{}_recipes_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "Recipe submissions by input kind and status"
    );

    describe_histogram!(
        format!("{}_ingestion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Recipe ingestion latency in seconds"
    );

    // Suggestion metrics
    describe_counter!(
        format!("{}_suggestions_total", METRICS_PREFIX),
        Unit::Count,
        "Recipe suggestions by status"
    );

    describe_histogram!(
        format!("{}_suggestion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Recipe suggestion latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Count one extraction call; `outcome` is "success", "rate_limited" or "error"
pub fn record_extraction_attempt(outcome: &'static str) {
    counter!(
        format!("{}_extraction_attempts_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_rate_limit_retry() {
    counter!(format!("{}_extraction_rate_limit_retries_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record ingestion metrics
pub fn record_ingestion(duration_secs: f64, input_kind: &'static str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_recipes_ingested_total", METRICS_PREFIX),
        "kind" => input_kind,
        "status" => status
    )
    .increment(1);

    histogram!(
        format!("{}_ingestion_duration_seconds", METRICS_PREFIX),
        "kind" => input_kind
    )
    .record(duration_secs);
}

/// Helper to record suggestion metrics
pub fn record_suggestion(duration_secs: f64, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_suggestions_total", METRICS_PREFIX),
        "status" => status
    )
    .increment(1);

    histogram!(format!("{}_suggestion_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_buckets() {
        let mut prev = 0.0;
        for &bucket in EXTRACTION_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        // Worst-case backoff (1s + 2s + 4s) must land inside the range
        assert!(EXTRACTION_BUCKETS.iter().any(|&b| b >= 7.0));
    }

    #[test]
    fn test_recording_without_recorder() {
        let metrics = RequestMetrics::start("POST", "/recipes");
        metrics.finish(201);
        record_extraction_attempt("success");
        record_rate_limit_retry();
        record_ingestion(0.5, "text", true);
        record_suggestion(0.2, false);
    }
}
