//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pipecrypt_sessions_total` (counter): sessions by `outcome`
//!   (admitted, rejected, auth_rejected)
//! - `pipecrypt_jobs_total` (counter): chunks encrypted by workers
//! - `pipecrypt_bytes_encrypted_total` (counter): bytes returned to clients
//! - `pipecrypt_active_sessions` (gauge): admitted sessions still open
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_session(outcome: &'static str) {
    metrics::counter!("pipecrypt_sessions_total", "outcome" => outcome).increment(1);
}

pub fn record_job(bytes: usize) {
    metrics::counter!("pipecrypt_jobs_total").increment(1);
    tracing::trace!(bytes, "Job processed");
}

pub fn record_bytes(bytes: u64) {
    metrics::counter!("pipecrypt_bytes_encrypted_total").increment(bytes);
}

pub fn set_active_sessions(count: usize) {
    metrics::gauge!("pipecrypt_active_sessions").set(count as f64);
}
