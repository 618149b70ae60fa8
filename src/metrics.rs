//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Ingestion Metrics
    pub static ref INGESTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("commentcompass_ingestions_total", "Total number of comment batch ingestions"),
        &["status"]
    ).expect("metric can be created");
    pub static ref COMMENTS_PROCESSED_TOTAL: IntCounter = IntCounter::new(
        "commentcompass_comments_processed_total",
        "Total number of comments processed through ingestion"
    ).expect("metric can be created");
    pub static ref QUOTA_REJECTIONS_TOTAL: IntCounter = IntCounter::new(
        "commentcompass_quota_rejections_total",
        "Total number of ingestions rejected by the free plan limit"
    ).expect("metric can be created");

    // NLP Boundary Metrics
    pub static ref NLP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("commentcompass_nlp_requests_total", "Total number of NLP analysis requests"),
        &["status"]
    ).expect("metric can be created");
    pub static ref NLP_REQUEST_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "commentcompass_nlp_request_duration_seconds",
            "NLP analysis request duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0])
    ).expect("metric can be created");

    // Identity Boundary Metrics
    pub static ref IDENTITY_VERIFICATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("commentcompass_identity_verifications_total", "Total number of identity credential verifications"),
        &["status"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("commentcompass_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(INGESTIONS_TOTAL.clone()))
        .expect("INGESTIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(COMMENTS_PROCESSED_TOTAL.clone()))
        .expect("COMMENTS_PROCESSED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(QUOTA_REJECTIONS_TOTAL.clone()))
        .expect("QUOTA_REJECTIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(NLP_REQUESTS_TOTAL.clone()))
        .expect("NLP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(NLP_REQUEST_DURATION_SECONDS.clone()))
        .expect("NLP_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(IDENTITY_VERIFICATIONS_TOTAL.clone()))
        .expect("IDENTITY_VERIFICATIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Record the outcome and duration of one NLP analysis request.
pub fn observe_nlp_request(status: &str, duration: std::time::Duration) {
    NLP_REQUESTS_TOTAL.with_label_values(&[status]).inc();
    NLP_REQUEST_DURATION_SECONDS.observe(duration.as_secs_f64());
}
