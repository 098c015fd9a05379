//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the SDK.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration for the SDK.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SdkConfig {
    /// Gateway address, namespace and transport tuning.
    pub gateway: GatewayConfig,

    /// Credential used to sign every outbound call.
    pub auth: AuthCredential,

    /// Optional JSON file holding the credential (`chainid`, `id`, `key`).
    /// Only consulted when `auth` is empty.
    pub auth_file: Option<String>,

    /// Fee schedule and gas price polling.
    pub fees: FeeConfig,

    /// Local account provider settings.
    pub keystore: KeystoreConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Gateway connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Logical gateway hostname. Always sent as the `Host` header.
    pub host: String,

    /// `http` or `https`.
    pub protocol: String,

    /// Port to dial; the protocol default when unset.
    pub port: Option<u16>,

    /// JSON-RPC method namespace (e.g. `tcapi`).
    pub namespace: String,

    /// Total attempts per call, first try included.
    pub retry: u32,

    /// Base backoff between attempts in milliseconds (0 = retry immediately).
    pub retry_base_delay_ms: u64,

    /// Backoff cap in milliseconds.
    pub retry_max_delay_ms: u64,

    /// Period of the background DNS refresh in seconds.
    pub dns_refresh_interval_secs: u64,

    /// Forced refreshes closer together than this are coalesced.
    pub force_refresh_debounce_ms: u64,

    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Deadline in seconds for the whole exchange: connect, send, headers and
    /// body. A reply still streaming when it expires fails as a timeout.
    pub response_timeout_secs: u64,

    /// Idle pooled connections are closed after this many seconds.
    pub idle_timeout_secs: u64,

    /// Maximum idle pooled connections per host.
    pub max_idle_connections: usize,

    /// Skip certificate verification. The socket is dialed by IP, so the
    /// certificate never matches the literal we connect to.
    pub accept_invalid_certs: bool,
}

impl GatewayConfig {
    pub fn dns_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.dns_refresh_interval_secs)
    }

    pub fn force_refresh_debounce(&self) -> Duration {
        Duration::from_millis(self.force_refresh_debounce_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "rpc-baas-blockchain.xunlei.com".to_string(),
            protocol: "https".to_string(),
            port: None,
            namespace: "tcapi".to_string(),
            retry: 2,
            retry_base_delay_ms: 0,
            retry_max_delay_ms: 1000,
            dns_refresh_interval_secs: 60,
            force_refresh_debounce_ms: 1000,
            connect_timeout_secs: 15,
            response_timeout_secs: 120,
            idle_timeout_secs: 120,
            max_idle_connections: 200,
            accept_invalid_certs: true,
        }
    }
}

/// Shared-secret credential issued by the gateway operator.
///
/// Any empty field disables request authentication.
#[derive(Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthCredential {
    #[serde(rename = "chainid")]
    pub chain_id: String,

    #[serde(rename = "id", alias = "sdkid")]
    pub sdk_id: String,

    #[serde(rename = "key")]
    pub secret_key: String,
}

impl AuthCredential {
    pub fn new(chain_id: impl Into<String>, sdk_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            sdk_id: sdk_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// All three fields present.
    pub fn is_complete(&self) -> bool {
        !self.chain_id.is_empty() && !self.sdk_id.is_empty() && !self.secret_key.is_empty()
    }

    /// All three fields absent.
    pub fn is_empty(&self) -> bool {
        self.chain_id.is_empty() && self.sdk_id.is_empty() && self.secret_key.is_empty()
    }
}

impl std::fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCredential")
            .field("chain_id", &self.chain_id)
            .field("sdk_id", &self.sdk_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Fee schedule and gas price polling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Poll period in seconds.
    pub poll_interval_secs: u64,

    /// Refresh the cached gas price from the gateway.
    pub fetch_gas_price: bool,

    /// Refresh the service fee schedule from the gateway.
    pub fetch_fee: bool,

    /// Gas price used when the caller supplies none and no polled value exists.
    pub default_gas_price: u64,
}

impl FeeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            fetch_gas_price: false,
            fetch_fee: false,
            default_gas_price: 100_000_000_000,
        }
    }
}

/// Local keystore settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeystoreConfig {
    /// Environment variable holding comma-separated `hexkey[:passphrase]` entries.
    pub private_keys_env: String,

    /// Address -> passphrase pairs unlocked at start-up.
    pub unlock: HashMap<String, String>,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            private_keys_env: "BAAS_SDK_PRIVATE_KEYS".to_string(),
            unlock: HashMap::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit single-line compact logs instead of the multi-line pretty format.
    pub compact: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            compact: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SdkConfig::default();
        assert_eq!(config.gateway.retry, 2);
        assert_eq!(config.gateway.connect_timeout(), Duration::from_secs(15));
        assert_eq!(config.gateway.response_timeout(), Duration::from_secs(120));
        assert_eq!(config.fees.poll_interval(), Duration::from_secs(30));
        assert!(config.auth.is_empty());
    }

    #[test]
    fn test_credential_uses_auth_json_keys() {
        let cred: AuthCredential =
            serde_json::from_str(r#"{"chainid":"30261","id":"dev-1","key":"s3cret"}"#).unwrap();
        assert_eq!(cred.chain_id, "30261");
        assert_eq!(cred.sdk_id, "dev-1");
        assert!(cred.is_complete());
        assert!(!format!("{:?}", cred).contains("s3cret"));
    }

    #[test]
    fn test_partial_toml() {
        let config: SdkConfig = toml::from_str(
            r#"
            [gateway]
            host = "gw.example.com"
            retry = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.host, "gw.example.com");
        assert_eq!(config.gateway.retry, 3);
        assert_eq!(config.gateway.namespace, "tcapi");
    }
}
