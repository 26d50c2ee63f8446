//! Prometheus Metrics Module
//!
//! Exposes updater metrics in Prometheus format.
//!
//! # Metrics
//!
//! - `market_updater_ticks_total{kind}`: pipeline runs started
//! - `market_updater_fetch_failures_total{kind, error_kind}`: failed fetches
//! - `market_updater_documents_written_total{kind}`: documents stored
//! - `market_updater_write_failures_total{kind}`: documents not stored
//! - `market_updater_tick_duration_seconds{kind}`: wall time per run
//!
//! Recording functions are no-ops until a recorder is installed, so library
//! code and tests call them unconditionally.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

const TICKS: &str = "market_updater_ticks_total";
const FETCH_FAILURES: &str = "market_updater_fetch_failures_total";
const DOCUMENTS_WRITTEN: &str = "market_updater_documents_written_total";
const WRITE_FAILURES: &str = "market_updater_write_failures_total";
const TICK_DURATION: &str = "market_updater_tick_duration_seconds";

/// Tick duration buckets, 10ms to 60s.
const TICK_DURATION_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Error type for metrics setup.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure the exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install the exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Start the Prometheus exporter on `0.0.0.0:port`, serving `/metrics`.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns an error if the exporter cannot be configured or installed
/// (port in use, recorder already set).
pub fn init_metrics(port: u16) -> Result<(), MetricsError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(TICK_DURATION.to_string()),
            TICK_DURATION_BUCKETS,
        )
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    register_metrics();

    tracing::info!(%addr, "Prometheus metrics exporter started");
    Ok(())
}

fn register_metrics() {
    describe_counter!(TICKS, "Pipeline runs started, by kind");
    describe_counter!(FETCH_FAILURES, "Listings fetches that failed, by error kind");
    describe_counter!(DOCUMENTS_WRITTEN, "Documents written to the store");
    describe_counter!(WRITE_FAILURES, "Documents that failed to write");
    describe_histogram!(TICK_DURATION, "Wall time of one pipeline run in seconds");
}

/// Record one finished pipeline run.
pub fn record_tick(kind: &'static str, elapsed: Duration) {
    counter!(TICKS, "kind" => kind).increment(1);
    histogram!(TICK_DURATION, "kind" => kind).record(elapsed.as_secs_f64());
}

/// Record a failed fetch.
pub fn record_fetch_failure(kind: &'static str, error_kind: &'static str) {
    counter!(FETCH_FAILURES, "kind" => kind, "error_kind" => error_kind).increment(1);
}

/// Record successfully written documents.
pub fn record_documents_written(kind: &'static str, count: usize) {
    if count > 0 {
        counter!(DOCUMENTS_WRITTEN, "kind" => kind).increment(count as u64);
    }
}

/// Record documents that failed to write.
pub fn record_write_failures(kind: &'static str, count: usize) {
    if count > 0 {
        counter!(WRITE_FAILURES, "kind" => kind).increment(count as u64);
    }
}
