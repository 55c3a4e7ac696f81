//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dapp_tx_submitted_total` (counter): transactions sent, by contract function
//! - `dapp_sequence_outcome_total` (counter): finished sequences, by flow and outcome
//! - `dapp_read_errors_total` (counter): failed contract reads, by read kind
//! - `dapp_read_cache_entries` (gauge): cached read values
//! - `dapp_rpc_health` (gauge): 1=healthy, 0=unhealthy

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_tx_submitted(function: &'static str) {
    ::metrics::counter!("dapp_tx_submitted_total", "kind" => function).increment(1);
}

pub fn record_sequence_outcome(flow: &'static str, outcome: &'static str) {
    ::metrics::counter!(
        "dapp_sequence_outcome_total",
        "flow" => flow,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_read_error(kind: &'static str) {
    ::metrics::counter!("dapp_read_errors_total", "kind" => kind).increment(1);
}

pub fn record_cache_size(entries: usize) {
    ::metrics::gauge!("dapp_read_cache_entries").set(entries as f64);
}

pub fn record_rpc_health(healthy: bool) {
    ::metrics::gauge!("dapp_rpc_health").set(if healthy { 1.0 } else { 0.0 });
}
