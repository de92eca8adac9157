//! Prometheus Metrics Definitions
//!
//! Defines the worktrail metrics with appropriate labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Result-set size buckets for search and export.
const RESULT_SIZE_BUCKETS: &[f64] = &[0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<WorktrailMetrics>> = Lazy::new(WorktrailMetrics::new);

/// Container for all worktrail metrics.
#[derive(Clone)]
pub struct WorktrailMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Filter runs - labels: kind (list, search, export)
    pub searches_total: CounterVec,

    /// Matched experiences per filter run - labels: kind
    pub search_results: HistogramVec,
}

fn registration_error(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

impl WorktrailMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "worktrail_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "worktrail_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            searches_total: register_counter_vec!(
                "worktrail_searches_total",
                "Total number of experience filter runs",
                &["kind"]
            )
            .map_err(|e| registration_error("searches_total", e))?,

            search_results: register_histogram_vec!(
                "worktrail_search_results",
                "Experiences matched per filter run",
                &["kind"],
                RESULT_SIZE_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("search_results", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record one filter run and the number of experiences it kept.
    pub fn record_search(&self, kind: &str, matched: usize) {
        self.searches_total.with_label_values(&[kind]).inc();
        self.search_results
            .with_label_values(&[kind])
            .observe(matched as f64);
    }
}

/// Record a filter run if metrics initialized.
pub fn record_search(kind: &str, matched: usize) {
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_search(kind, matched);
    }
}

/// Record a CSV export if metrics initialized.
pub fn record_export() {
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.searches_total.with_label_values(&["export"]).inc();
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    // Touch the registry so an idle server still exports its families.
    Lazy::force(&METRICS);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        assert!(!metrics.http_requests_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_search_counts() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        let before = metrics.searches_total.with_label_values(&["search"]).get();
        record_search("search", 3);
        let after = metrics.searches_total.with_label_values(&["search"]).get();
        assert!(after >= before + 1.0);
        Ok(())
    }
}
