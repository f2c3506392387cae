//! Request pipeline metrics.
//!
//! Recorded through the [`metrics`] facade; the library installs no
//! recorder or exporter. Applications that want the numbers install one (for
//! example `metrics-exporter-prometheus`) and call [`describe_metrics`] once.
//!
//! | metric | type | labels |
//! |---|---|---|
//! | `requests_dispatched_total` | counter | `bucket` |
//! | `requests_retried_total` | counter | `bucket` |
//! | `requests_failed_total` | counter | `bucket`, `kind` |
//! | `requests_rate_limited_total` | counter | `bucket` |
//! | `request_duration_seconds` | histogram | `bucket` |

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Register descriptions of all request metrics with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        "requests_dispatched_total",
        "Total number of transport attempts started"
    );
    describe_counter!(
        "requests_retried_total",
        "Total number of transient failures that were retried"
    );
    describe_counter!(
        "requests_failed_total",
        "Total number of requests that terminated with an error"
    );
    describe_counter!(
        "requests_rate_limited_total",
        "Total number of dispatches held back by a bucket delay"
    );
    describe_histogram!(
        "request_duration_seconds",
        "Time taken by one transport attempt"
    );
}

/// Requester metrics recorder.
pub struct RequestMetrics;

impl RequestMetrics {
    /// Record a transport attempt being started.
    pub fn record_dispatch(bucket: &str) {
        counter!("requests_dispatched_total", "bucket" => bucket.to_string()).increment(1);
    }

    /// Record a transient failure scheduled for retry.
    pub fn record_retry(bucket: &str) {
        counter!("requests_retried_total", "bucket" => bucket.to_string()).increment(1);
    }

    /// Record a request terminating with an error of `kind`.
    pub fn record_failure(bucket: &str, kind: &'static str) {
        counter!(
            "requests_failed_total",
            "bucket" => bucket.to_string(),
            "kind" => kind
        )
        .increment(1);
    }

    /// Record a dispatch delayed by the bucket's rate limit.
    pub fn record_rate_limited(bucket: &str) {
        counter!("requests_rate_limited_total", "bucket" => bucket.to_string()).increment(1);
    }

    /// Record how long a transport attempt took.
    pub fn record_duration(bucket: &str, duration: Duration) {
        histogram!("request_duration_seconds", "bucket" => bucket.to_string())
            .record(duration.as_secs_f64());
    }
}
