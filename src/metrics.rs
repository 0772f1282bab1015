//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{Counter, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("clipstream_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "clipstream_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Storage Metrics
    pub static ref MEDIA_UPLOADS_TOTAL: IntCounter = IntCounter::new(
        "clipstream_media_uploads_total",
        "Total number of media uploads"
    ).expect("metric can be created");
    pub static ref MEDIA_BYTES_UPLOADED: Counter = Counter::new(
        "clipstream_media_bytes_uploaded_total",
        "Total bytes of media uploaded"
    ).expect("metric can be created");

    // Engagement Metrics
    pub static ref RELATION_TOGGLES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("clipstream_relation_toggles_total", "Total number of relation toggles"),
        &["kind", "state"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("clipstream_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(MEDIA_UPLOADS_TOTAL.clone()))
        .expect("MEDIA_UPLOADS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(MEDIA_BYTES_UPLOADED.clone()))
        .expect("MEDIA_BYTES_UPLOADED can be registered");
    REGISTRY
        .register(Box::new(RELATION_TOGGLES_TOTAL.clone()))
        .expect("RELATION_TOGGLES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
