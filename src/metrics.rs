use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_gauge, Encoder, HistogramVec,
    IntCounter, IntGauge, TextEncoder,
};
use std::time::Instant;

use crate::{Result, SeriesError};

lazy_static! {
    // Request metrics
    pub static ref REQUEST_COUNTER: IntCounter = register_int_counter!(
        "sample_requests_total",
        "Total number of requests received"
    ).unwrap();

    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "sample_request_duration_seconds",
        "Request duration in seconds",
        &["endpoint"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    ).unwrap();

    pub static ref REJECTED_REQUESTS: IntCounter = register_int_counter!(
        "sample_rejected_requests_total",
        "Total number of requests rejected as malformed"
    ).unwrap();

    // Storage metrics
    pub static ref SAMPLES_INSERTED: IntCounter = register_int_counter!(
        "samples_inserted_total",
        "Total number of samples inserted"
    ).unwrap();

    pub static ref SAMPLES_STORED: IntGauge = register_int_gauge!(
        "samples_stored",
        "Number of samples currently held in storage"
    ).unwrap();

    // Query metrics
    pub static ref SELECT_QUERIES: IntCounter = register_int_counter!(
        "sample_select_queries_total",
        "Total number of range queries served"
    ).unwrap();

    pub static ref ROWS_RETURNED: IntCounter = register_int_counter!(
        "sample_rows_returned_total",
        "Total number of result rows returned by range queries"
    ).unwrap();
}

pub fn init_metrics() {
    lazy_static::initialize(&REQUEST_COUNTER);
    lazy_static::initialize(&REQUEST_DURATION);
    lazy_static::initialize(&REJECTED_REQUESTS);
    lazy_static::initialize(&SAMPLES_INSERTED);
    lazy_static::initialize(&SAMPLES_STORED);
    lazy_static::initialize(&SELECT_QUERIES);
    lazy_static::initialize(&ROWS_RETURNED);
}

/// Counts a request on creation and records its duration when dropped.
pub struct RequestTimer {
    endpoint: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn new(endpoint: &'static str) -> Self {
        REQUEST_COUNTER.inc();
        Self {
            endpoint,
            start: Instant::now(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        REQUEST_DURATION
            .with_label_values(&[self.endpoint])
            .observe(duration);
    }
}

pub fn record_rejected_request() {
    REJECTED_REQUESTS.inc();
}

pub fn record_samples_inserted(count: usize, stored: usize) {
    SAMPLES_INSERTED.inc_by(count as u64);
    SAMPLES_STORED.set(stored as i64);
}

pub fn record_select(rows: usize) {
    SELECT_QUERIES.inc();
    ROWS_RETURNED.inc_by(rows as u64);
}

/// Renders every registered metric in the prometheus text format.
pub fn gather_text() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| SeriesError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| SeriesError::Internal(format!("Metrics are not valid UTF-8: {}", e)))
}
