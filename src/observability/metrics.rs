//! Metrics emitted through the `metrics` facade.
//!
//! # Metrics
//! - `baas_rpc_requests_total` (counter): calls by method and outcome
//! - `baas_rpc_retries_total` (counter): transport retries by method
//! - `baas_endpoint_refresh_total` (counter): DNS refreshes by trigger and outcome
//! - `baas_nonce_lock_wait_seconds` (histogram): time spent waiting for an address lock
//! - `baas_gas_price_wei` (gauge): last polled gas price
//!
//! The library never installs a recorder; without one these calls are no-ops.

use std::time::Duration;

pub fn record_rpc_request(method: &str, outcome: &'static str) {
    metrics::counter!("baas_rpc_requests_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_rpc_retry(method: &str) {
    metrics::counter!("baas_rpc_retries_total", "method" => method.to_string()).increment(1);
}

pub fn record_endpoint_refresh(trigger: &'static str, outcome: &'static str) {
    metrics::counter!("baas_endpoint_refresh_total", "trigger" => trigger, "outcome" => outcome).increment(1);
}

pub fn record_nonce_lock_wait(wait: Duration) {
    metrics::histogram!("baas_nonce_lock_wait_seconds").record(wait.as_secs_f64());
}

pub fn record_gas_price(wei: f64) {
    metrics::gauge!("baas_gas_price_wei").set(wei);
}
