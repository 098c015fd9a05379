//! JSON-RPC wire entities.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Every request carries this id; the gateway echoes it.
pub const REQUEST_ID: u64 = 1;

/// Per-call authentication token. Never carries the secret key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "chainid")]
    pub chain_id: String,
    #[serde(rename = "sdkid")]
    pub sdk_id: String,
    /// Single-use random string. Unrelated to the transaction nonce.
    #[serde(rename = "rand")]
    pub nonce: String,
    #[serde(rename = "sign")]
    pub signature: String,
}

/// Outbound JSON-RPC 2.0 envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<Value>,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: REQUEST_ID,
            auth: None,
            extension: None,
        }
    }
}

/// Reads JSON `null` as the type's default, like a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Gateway reply. `error` may be absent, null, or zeroed on success; `id` is
/// null when the gateway could not read the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub jsonrpc: String,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// The application error, if the code says the call failed.
    pub fn error(&self) -> Option<&RpcError> {
        self.error.as_ref().filter(|err| !err.is_success())
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.error {
            Some(err) if !err.is_success() => Err(err),
            _ => Ok(self.result),
        }
    }
}

/// Side-channel metadata attached to contract-invoking submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractExtension {
    pub callback: String,
    pub prepay_id: String,
    pub service_id: String,
    pub tx_type: String,
    pub sign: String,
    pub title: String,
    pub desc: String,
}

impl Default for ContractExtension {
    fn default() -> Self {
        Self {
            callback: String::new(),
            prepay_id: String::new(),
            service_id: String::new(),
            tx_type: "contract".to_string(),
            sign: String::new(),
            title: String::new(),
            desc: String::new(),
        }
    }
}

/// Parse a quantity the way the gateway writes them: `0x`-prefixed hex or decimal.
pub fn parse_quantity(text: &str) -> Option<U256> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if hex.is_empty() {
            return None;
        }
        U256::from_str_radix(hex, 16).ok()
    } else if text.is_empty() {
        None
    } else {
        U256::from_str_radix(text, 10).ok()
    }
}

/// Read a quantity from a JSON result that may be a string or a number.
pub fn quantity_from_value(value: &Value) -> Option<U256> {
    match value {
        Value::String(text) => parse_quantity(text),
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .map(U256::from),
        _ => None,
    }
}

/// `0x`-prefixed lowercase hex, as sent on the wire.
pub fn to_quantity(value: U256) -> String {
    format!("{:#x}", value)
}
