//! Method-name dispatch for JSON callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::args;
use crate::error::{ApiError, ErrorCode, SdkError, SdkResult};
use crate::sdk::Sdk;

/// Names accepted by [`dispatch`].
pub const METHODS: &[&str] = &[
    "newAccount",
    "accounts",
    "getBalance",
    "getTransactionCount",
    "blockNumber",
    "getTransactionByHash",
    "getTransactionReceipt",
    "getBlockByNumber",
    "getBlockByHash",
    "sendTransaction",
    "sendContractTransaction",
    "call",
    "signTransaction",
    "sendRawTransaction",
];

/// Reply envelope handed back to JSON callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiReply {
    pub id: u64,
    pub jsonrpc: String,
    pub result: Value,
    pub errcode: i64,
    pub errmsg: String,
}

impl ApiReply {
    pub fn from_result(result: Result<Value, ApiError>) -> Self {
        match result {
            Ok(result) => Self {
                id: 1,
                jsonrpc: "2.0".to_string(),
                result,
                errcode: ErrorCode::Success.code(),
                errmsg: String::new(),
            },
            Err(err) => Self {
                id: 1,
                jsonrpc: "2.0".to_string(),
                result: Value::Null,
                errcode: err.code,
                errmsg: err.message,
            },
        }
    }
}

fn arity(params: &[Value], allowed: &[usize]) -> SdkResult<()> {
    if allowed.contains(&params.len()) {
        Ok(())
    } else {
        Err(SdkError::invalid(
            ErrorCode::Params,
            format!("expected {:?} arguments, got {}", allowed, params.len()),
        ))
    }
}

fn to_json<T: Serialize>(value: T) -> SdkResult<Value> {
    serde_json::to_value(value).map_err(|e| SdkError::invalid(ErrorCode::JsonUnmarshal, e))
}

/// Run `method` with positional `params` (a JSON array).
pub async fn dispatch(sdk: &Sdk, method: &str, params: Value) -> Result<Value, ApiError> {
    let result = run(sdk, method, params).await;
    if let Err(e) = &result {
        tracing::debug!(method, code = e.code(), error = %e, "Api call failed");
    }
    result.map_err(ApiError::from)
}

async fn run(sdk: &Sdk, method: &str, params: Value) -> SdkResult<Value> {
    let params = match params {
        Value::Array(params) => params,
        Value::Null => Vec::new(),
        _ => return Err(SdkError::invalid(ErrorCode::Params, "params must be an array")),
    };
    let p = params.as_slice();

    match method {
        "newAccount" => {
            arity(p, &[1])?;
            let passphrase = args::parse_string(&p[0], ErrorCode::Params, "passphrase")?;
            to_json(sdk.new_account(&passphrase)?)
        }
        "accounts" => {
            arity(p, &[0])?;
            to_json(sdk.accounts())
        }
        "getBalance" => {
            arity(p, &[1])?;
            let address = args::parse_address(&p[0], ErrorCode::Params, "account")?;
            to_json(sdk.get_balance(address).await?)
        }
        "getTransactionCount" => {
            arity(p, &[1])?;
            let address = args::parse_address(&p[0], ErrorCode::Params, "account")?;
            to_json(sdk.get_transaction_count(address).await?)
        }
        "blockNumber" => {
            arity(p, &[0])?;
            to_json(sdk.block_number().await?)
        }
        "getTransactionByHash" => {
            arity(p, &[2])?;
            let from = args::parse_address(&p[0], ErrorCode::Params, "from")?;
            let hash = args::parse_hash(&p[1], ErrorCode::Params, "hash")?;
            sdk.get_transaction_by_hash(from, hash).await
        }
        "getTransactionReceipt" => {
            arity(p, &[1])?;
            let hash = args::parse_hash(&p[0], ErrorCode::Params, "hash")?;
            sdk.get_transaction_receipt(hash).await
        }
        "getBlockByNumber" => {
            arity(p, &[1, 2])?;
            let number = args::parse_block_number(&p[0])?;
            let full = match p.get(1) {
                Some(full) => args::parse_bool(full, ErrorCode::Params, "fullTx")?,
                None => false,
            };
            sdk.get_block_by_number(number, full).await
        }
        "getBlockByHash" => {
            arity(p, &[1, 2])?;
            let hash = args::parse_hash(&p[0], ErrorCode::Params, "hash")?;
            let full = match p.get(1) {
                Some(full) => args::parse_bool(full, ErrorCode::Params, "fullTx")?,
                None => false,
            };
            sdk.get_block_by_hash(hash, full).await
        }
        "sendTransaction" => {
            arity(p, &[1, 2])?;
            let tx = args::parse_tx_args(&p[0], ErrorCode::SendTxArgs)?;
            let passphrase = match p.get(1) {
                Some(value) => Some(args::parse_string(value, ErrorCode::Params, "passphrase")?),
                None => None,
            };
            to_json(sdk.send_transaction(tx, passphrase.as_deref()).await?)
        }
        "sendContractTransaction" => {
            arity(p, &[1, 2, 3])?;
            let tx = args::parse_tx_args(&p[0], ErrorCode::SendTxArgs)?;
            let (passphrase, extension) = match p {
                [_] => (None, None),
                [_, ext] => (None, Some(args::parse_extension(ext)?)),
                [_, passphrase, ext, ..] => (
                    Some(args::parse_string(passphrase, ErrorCode::Params, "passphrase")?),
                    Some(args::parse_extension(ext)?),
                ),
                [] => return Err(SdkError::invalid(ErrorCode::Params, "missing transaction args")),
            };
            to_json(
                sdk.send_contract_transaction(tx, passphrase.as_deref(), extension.as_ref())
                    .await?,
            )
        }
        "call" => {
            arity(p, &[1])?;
            let request = args::parse_call(&p[0])?;
            sdk.call(&request).await
        }
        "signTransaction" => {
            arity(p, &[1])?;
            let tx = args::parse_tx_args(&p[0], ErrorCode::SignTxArgs)?;
            to_json(sdk.sign_tx(tx).await?)
        }
        "sendRawTransaction" => {
            arity(p, &[1])?;
            let raw = args::parse_string(&p[0], ErrorCode::SendRawTransaction, "raw")?;
            sdk.send_raw_transaction(&raw).await
        }
        other => Err(SdkError::MethodNotFound(other.to_string())),
    }
}
