//! Typed arguments parsed from JSON params.
//!
//! Every malformed input becomes an [`SdkError::InvalidParams`] carrying the
//! code of the operation being parsed; nothing here panics.

use alloy::primitives::{Address, Bytes, B256, U256};
use serde_json::{Map, Value};

use crate::blockchain::TxArgs;
use crate::error::{ErrorCode, SdkError, SdkResult};
use crate::rpc::types::{parse_quantity, ContractExtension};

/// Arguments of a read-only contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: String,
    pub data: String,
}

fn object<'a>(value: &'a Value, code: ErrorCode, what: &str) -> SdkResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| SdkError::invalid(code, format!("{} must be an object", what)))
}

/// Present and not null.
fn field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| !value.is_null())
}

pub fn parse_address(value: &Value, code: ErrorCode, name: &str) -> SdkResult<Address> {
    let text = value
        .as_str()
        .ok_or_else(|| SdkError::invalid(code, format!("{} must be a string", name)))?;
    text.trim()
        .parse::<Address>()
        .map_err(|_| SdkError::invalid(code, format!("invalid {} address", name)))
}

pub fn parse_hash(value: &Value, code: ErrorCode, name: &str) -> SdkResult<B256> {
    let text = value
        .as_str()
        .ok_or_else(|| SdkError::invalid(code, format!("{} must be a string", name)))?;
    text.trim()
        .parse::<B256>()
        .map_err(|_| SdkError::invalid(code, format!("invalid {}", name)))
}

/// Quantity given as a `0x`-hex or decimal string, or a non-negative integer.
pub fn parse_u256(value: &Value, code: ErrorCode, name: &str) -> SdkResult<U256> {
    let parsed = match value {
        Value::String(text) => parse_quantity(text),
        Value::Number(number) => number.as_u64().map(U256::from),
        _ => None,
    };
    parsed.ok_or_else(|| SdkError::invalid(code, format!("{} err", name)))
}

pub fn parse_u64(value: &Value, code: ErrorCode, name: &str) -> SdkResult<u64> {
    let quantity = parse_u256(value, code, name)?;
    u64::try_from(quantity).map_err(|_| SdkError::invalid(code, format!("{} out of range", name)))
}

pub fn parse_bytes(value: &Value, code: ErrorCode, name: &str) -> SdkResult<Bytes> {
    let text = value
        .as_str()
        .ok_or_else(|| SdkError::invalid(code, format!("{} must be a string", name)))?;
    let hex = text.trim();
    let hex = hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X")).unwrap_or(hex);
    alloy::hex::decode(hex)
        .map(Bytes::from)
        .map_err(|_| SdkError::invalid(code, format!("invalid {} hex", name)))
}

pub fn parse_string(value: &Value, code: ErrorCode, name: &str) -> SdkResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SdkError::invalid(code, format!("{} must be a string", name)))
}

pub fn parse_bool(value: &Value, code: ErrorCode, name: &str) -> SdkResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| SdkError::invalid(code, format!("{} must be a boolean", name)))
}

/// Transaction arguments. `from` is required; everything else is optional.
pub fn parse_tx_args(value: &Value, code: ErrorCode) -> SdkResult<TxArgs> {
    let map = object(value, code, "transaction args")?;
    let from = field(map, "from").ok_or_else(|| SdkError::invalid(code, "from is required"))?;

    let mut args = TxArgs::new(parse_address(from, code, "from")?);
    if let Some(to) = field(map, "to") {
        args.to = Some(parse_address(to, code, "to")?);
    }
    if let Some(gas) = field(map, "gas") {
        args.gas = Some(parse_u64(gas, code, "gas")?);
    }
    if let Some(gas_price) = field(map, "gasPrice") {
        args.gas_price = Some(parse_u256(gas_price, code, "gasPrice")?);
    }
    if let Some(value) = field(map, "value") {
        args.value = Some(parse_u256(value, code, "value")?);
    }
    if let Some(data) = field(map, "data") {
        args.data = parse_bytes(data, code, "data")?;
    }
    if let Some(nonce) = field(map, "nonce") {
        args.nonce = Some(parse_u64(nonce, code, "nonce")?);
    }
    Ok(args)
}

/// Contract extension. Missing or non-string fields take their defaults.
pub fn parse_extension(value: &Value) -> SdkResult<ContractExtension> {
    let map = object(value, ErrorCode::ContractExtension, "extension")?;
    let text = |key: &str, default: &str| -> String {
        map.get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };
    Ok(ContractExtension {
        callback: text("callback", ""),
        prepay_id: text("prepay_id", ""),
        service_id: text("service_id", ""),
        tx_type: text("tx_type", "contract"),
        sign: text("sign", ""),
        title: text("title", ""),
        desc: text("desc", ""),
    })
}

pub fn parse_call(value: &Value) -> SdkResult<CallRequest> {
    let code = ErrorCode::SendTxArgs;
    let map = object(value, code, "call args")?;
    let text = |key: &str| -> String {
        map.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
    };
    let from = field(map, "from").ok_or_else(|| SdkError::invalid(code, "from is required"))?;
    Ok(CallRequest {
        from: parse_address(from, code, "from")?,
        to: text("to"),
        data: text("data"),
    })
}

/// Block height as a decimal string or an integer.
pub fn parse_block_number(value: &Value) -> SdkResult<u64> {
    let code = ErrorCode::Params;
    match value {
        Value::String(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| SdkError::invalid(code, "block number must be decimal")),
        Value::Number(number) => number
            .as_u64()
            .ok_or_else(|| SdkError::invalid(code, "block number must be a non-negative integer")),
        _ => Err(SdkError::invalid(code, "block number must be a string or integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FROM: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_full_tx_args() {
        let args = parse_tx_args(
            &json!({
                "from": FROM,
                "to": "0x0000000000000000000000000000000000000042",
                "gas": "0x5208",
                "gasPrice": "100000000000",
                "value": 7,
                "data": "0xabcd",
                "nonce": "0x3",
            }),
            ErrorCode::SendTxArgs,
        )
        .unwrap();
        assert_eq!(args.to, Some(Address::with_last_byte(0x42)));
        assert_eq!(args.gas, Some(21_000));
        assert_eq!(args.gas_price, Some(U256::from(100_000_000_000u64)));
        assert_eq!(args.value, Some(U256::from(7u64)));
        assert_eq!(args.data, Bytes::from(vec![0xab, 0xcd]));
        assert_eq!(args.nonce, Some(3));
    }

    #[test]
    fn test_minimal_tx_args() {
        let args = parse_tx_args(&json!({ "from": FROM, "nonce": null }), ErrorCode::SendTxArgs).unwrap();
        assert_eq!(args.to, None);
        assert_eq!(args.nonce, None);
        assert!(args.data.is_empty());
    }

    #[test]
    fn test_bad_tx_args_use_operation_code() {
        let cases = [
            json!("not an object"),
            json!({}),
            json!({ "from": "0x1234" }),
            json!({ "from": FROM, "to": "nope" }),
            json!({ "from": FROM, "gas": "0xzz" }),
            json!({ "from": FROM, "value": -1 }),
            json!({ "from": FROM, "data": "0xabc" }),
        ];
        for case in cases {
            let err = parse_tx_args(&case, ErrorCode::SignTxArgs).unwrap_err();
            assert!(err.is_validation(), "{case}");
            assert_eq!(err.code(), -1028, "{case}");
        }
    }

    #[test]
    fn test_extension_defaults() {
        let ext = parse_extension(&json!({ "callback": "http://cb", "title": 5 })).unwrap();
        assert_eq!(ext.callback, "http://cb");
        assert_eq!(ext.title, "");
        assert_eq!(ext.tx_type, "contract");

        let err = parse_extension(&json!([])).unwrap_err();
        assert_eq!(err.code(), -1012);
    }

    #[test]
    fn test_call_args() {
        let call = parse_call(&json!({ "from": FROM, "to": "0x42", "data": "0x" })).unwrap();
        assert_eq!(call.to, "0x42");
        assert!(parse_call(&json!({ "to": "0x42" })).is_err());
    }

    #[test]
    fn test_block_number_forms() {
        assert_eq!(parse_block_number(&json!("12")).unwrap(), 12);
        assert_eq!(parse_block_number(&json!(12)).unwrap(), 12);
        assert!(parse_block_number(&json!("0xc")).is_err());
        assert!(parse_block_number(&json!(true)).is_err());
    }
}
