//! Metrics module
//!
//! Prometheus counters and histograms for staging and uploads, registered in
//! the default registry.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    // Upload metrics
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "dataset_uploads_total",
        "Total number of file uploads",
        &["category", "status"]
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "dataset_upload_bytes_total",
        "Total bytes uploaded"
    ).unwrap();

    pub static ref UPLOAD_DURATION: HistogramVec = register_histogram_vec!(
        "dataset_upload_duration_seconds",
        "Upload request duration in seconds",
        &["category"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]
    ).unwrap();

    // Session metrics
    pub static ref STAGING_REJECTIONS: CounterVec = register_counter_vec!(
        "dataset_staging_rejections_total",
        "Files kept out of a session",
        &["reason"]  // "unsupported_type", "too_large" or "capacity"
    ).unwrap();

    pub static ref STALE_UPDATES: Counter = register_counter!(
        "dataset_stale_updates_total",
        "Upload results discarded because the entry was removed"
    ).unwrap();

    // API metrics
    pub static ref API_ERRORS: CounterVec = register_counter_vec!(
        "dataset_api_errors_total",
        "Failed dataset API reads",
        &["endpoint"]
    ).unwrap();
}

/// Record a successful upload
pub fn record_upload_success(category: &str, bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&[category, "success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
}

/// Record a failed upload
pub fn record_upload_failure(category: &str) {
    UPLOADS_TOTAL.with_label_values(&[category, "failure"]).inc();
}

/// Record upload duration
pub fn record_upload_duration(category: &str, duration_secs: f64) {
    UPLOAD_DURATION
        .with_label_values(&[category])
        .observe(duration_secs);
}

/// Record files excluded at staging time
pub fn record_staging_rejection(reason: &str, count: u64) {
    STAGING_REJECTIONS
        .with_label_values(&[reason])
        .inc_by(count as f64);
}

/// Record a result dropped for a removed entry
pub fn record_stale_update() {
    STALE_UPDATES.inc();
}

/// Record a failed API read
pub fn record_api_error(endpoint: &str) {
    API_ERRORS.with_label_values(&[endpoint]).inc();
}

/// Render every registered metric in the Prometheus text format
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
