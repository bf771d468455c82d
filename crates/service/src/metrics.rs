use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static RECORD_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalog_record_operations_total",
        "Record operations handled, by collection and operation",
        &["collection", "operation"]
    )
    .expect("register record_operations_total")
});

pub static RECORD_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalog_record_errors_total",
        "Record operations that failed, by collection and operation",
        &["collection", "operation"]
    )
    .expect("register record_errors_total")
});

pub static DOCUMENTS_SCANNED: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "catalog_documents_scanned",
        "Documents loaded per collection scan",
        vec![1.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0]
    )
    .expect("register documents_scanned")
});

pub fn record_operation(collection: &str, operation: &str) {
    RECORD_OPERATIONS_TOTAL.with_label_values(&[collection, operation]).inc();
}

pub fn record_error(collection: &str, operation: &str) {
    RECORD_ERRORS_TOTAL.with_label_values(&[collection, operation]).inc();
}

/// Render the default registry in the Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    Lazy::force(&RECORD_OPERATIONS_TOTAL);
    Lazy::force(&RECORD_ERRORS_TOTAL);
    Lazy::force(&DOCUMENTS_SCANNED);
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
