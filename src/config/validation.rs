//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that deserialize fine but
//! cannot work. Every problem is reported, not just the first.

use crate::config::schema::SdkConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self { field, reason: reason.into() }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SdkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let gateway = &config.gateway;

    if gateway.host.trim().is_empty() {
        errors.push(ValidationError::new("gateway.host", "must not be empty"));
    }
    if gateway.host.contains("://") || gateway.host.contains('/') {
        errors.push(ValidationError::new("gateway.host", "must be a bare hostname"));
    }
    if gateway.protocol != "http" && gateway.protocol != "https" {
        errors.push(ValidationError::new(
            "gateway.protocol",
            format!("expected http or https, got '{}'", gateway.protocol),
        ));
    }
    if gateway.namespace.is_empty() || gateway.namespace.contains('_') {
        errors.push(ValidationError::new("gateway.namespace", "must be non-empty and contain no '_'"));
    }
    if gateway.retry == 0 {
        errors.push(ValidationError::new("gateway.retry", "must allow at least one attempt"));
    }
    if gateway.retry_base_delay_ms > gateway.retry_max_delay_ms {
        errors.push(ValidationError::new("gateway.retry_base_delay_ms", "exceeds retry_max_delay_ms"));
    }
    if gateway.dns_refresh_interval_secs == 0 {
        errors.push(ValidationError::new("gateway.dns_refresh_interval_secs", "must be > 0"));
    }
    if gateway.connect_timeout_secs == 0 || gateway.response_timeout_secs == 0 {
        errors.push(ValidationError::new("gateway.timeouts", "must be > 0"));
    }

    if !config.auth.is_empty() && !config.auth.is_complete() {
        errors.push(ValidationError::new("auth", "chainid, id and key must be set together"));
    }

    if config.fees.poll_interval_secs == 0 {
        errors.push(ValidationError::new("fees.poll_interval_secs", "must be > 0"));
    }
    if config.fees.default_gas_price == 0 {
        errors.push(ValidationError::new("fees.default_gas_price", "must be > 0"));
    }

    for address in config.keystore.unlock.keys() {
        if address.parse::<alloy::primitives::Address>().is_err() {
            errors.push(ValidationError::new("keystore.unlock", format!("invalid address '{}'", address)));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
