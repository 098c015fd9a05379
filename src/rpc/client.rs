//! Typed gateway operations.
//!
//! # Responsibilities
//! - Name every gateway method under the configured namespace
//! - Shape params and auth params per method
//! - Decode results and map transport failures to the operation's error code

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::blockchain::fees::FeeSchedule;
use crate::blockchain::transaction::ChainQuery;
use crate::error::{ErrorCode, RpcError, SdkError, SdkResult, TransportError};
use crate::rpc::transport::{RpcCall, RpcTransport};
use crate::rpc::types::{parse_quantity, quantity_from_value, to_quantity, ContractExtension};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChainIdData {
    chainid: u64,
}

/// `_getBaasSdkConf` answers outside the JSON-RPC envelope.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChainIdReply {
    code: i64,
    msg: String,
    data: ChainIdData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeeReply {
    min: String,
    max: String,
    rate: i64,
}

/// Gateway client bound to one namespace.
#[derive(Debug, Clone)]
pub struct BaasClient {
    transport: Arc<RpcTransport>,
    namespace: String,
}

impl BaasClient {
    pub fn new(transport: Arc<RpcTransport>, namespace: impl Into<String>) -> Self {
        Self {
            transport,
            namespace: namespace.into(),
        }
    }

    pub fn transport(&self) -> &Arc<RpcTransport> {
        &self.transport
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn method(&self, verb: &str) -> String {
        format!("{}_{}", self.namespace, verb)
    }

    async fn request(&self, call: RpcCall, code: ErrorCode) -> SdkResult<Value> {
        let response = self
            .transport
            .call(&call)
            .await
            .map_err(|e| SdkError::transport(code, e))?;
        Ok(response.into_result()?)
    }

    fn unexpected(&self, verb: &str, code: ErrorCode, value: &Value) -> SdkError {
        SdkError::transport(
            code,
            TransportError::UnexpectedResult {
                method: self.method(verb),
                value: value.to_string(),
            },
        )
    }

    fn quantity(&self, verb: &str, code: ErrorCode, value: &Value) -> SdkResult<U256> {
        quantity_from_value(value).ok_or_else(|| self.unexpected(verb, code, value))
    }

    fn quantity_u64(&self, verb: &str, code: ErrorCode, value: &Value) -> SdkResult<u64> {
        let quantity = self.quantity(verb, code, value)?;
        u64::try_from(quantity).map_err(|_| self.unexpected(verb, code, value))
    }

    /// Chain id the gateway serves for this credential.
    pub async fn get_chain_id(&self) -> SdkResult<u64> {
        let code = ErrorCode::RpcGetChainId;
        let call = RpcCall::new(self.method("getBaasSdkConf"), Vec::new());
        let body = self
            .transport
            .call_raw(&call)
            .await
            .map_err(|e| SdkError::transport(code, e))?;
        let reply: ChainIdReply =
            serde_json::from_slice(&body).map_err(|e| SdkError::transport(code, TransportError::Decode(e)))?;
        if reply.code != 0 {
            return Err(RpcError { code: reply.code, message: reply.msg }.into());
        }
        tracing::info!(chain_id = reply.data.chainid, "Gateway chain id");
        Ok(reply.data.chainid)
    }

    /// Next nonce for `address`, counting pending transactions.
    pub async fn get_transaction_count(&self, address: Address) -> SdkResult<u64> {
        let code = ErrorCode::RpcGetNonce;
        let call = RpcCall::new(self.method("getTransactionCount"), vec![address.to_string(), "pending".into()]);
        match self.request(call, code).await? {
            Value::Null => Ok(0),
            value => self.quantity_u64("getTransactionCount", code, &value),
        }
    }

    /// Balance in wei; a null result means zero.
    pub async fn get_balance(&self, address: Address) -> SdkResult<U256> {
        let code = ErrorCode::RpcGetBalance;
        let call = RpcCall::new(self.method("getBalance"), vec![address.to_string(), "latest".into()]);
        match self.request(call, code).await? {
            Value::Null => Ok(U256::ZERO),
            value => self.quantity("getBalance", code, &value),
        }
    }

    /// Current gas price. The gateway answers with a number or a quantity string.
    pub async fn gas_price(&self) -> SdkResult<U256> {
        let code = ErrorCode::RpcGetGasPrice;
        let value = self.request(RpcCall::new(self.method("gasPrice"), Vec::new()), code).await?;
        self.quantity("gasPrice", code, &value)
    }

    /// Fee bounds and rate. Bounds arrive in wei and are scaled down by 1e11.
    pub async fn get_fee(&self) -> SdkResult<FeeSchedule> {
        let code = ErrorCode::RpcGetFee;
        let value = self.request(RpcCall::new(self.method("getFee"), Vec::new()), code).await?;
        let reply: FeeReply =
            serde_json::from_value(value.clone()).map_err(|e| SdkError::transport(code, TransportError::Decode(e)))?;
        let min = parse_quantity(&reply.min).ok_or_else(|| self.unexpected("getFee", code, &value))?;
        let max = parse_quantity(&reply.max).ok_or_else(|| self.unexpected("getFee", code, &value))?;
        Ok(FeeSchedule::from_gateway(min, max, reply.rate))
    }

    /// Gas needed to execute the call described by the arguments.
    pub async fn estimate_gas(&self, from: Address, to: Option<Address>, data: &Bytes, value: U256) -> SdkResult<u64> {
        let code = ErrorCode::RpcEstimateGas;
        let from = from.to_string();
        let to = to.map(|to| to.to_string()).unwrap_or_default();
        let data = alloy::hex::encode_prefixed(data);
        let value = to_quantity(value);

        let mut object = json!({ "from": from, "data": data, "value": value });
        if !to.is_empty() {
            object["to"] = Value::String(to.clone());
        }
        let call = RpcCall::structured(self.method("estimateGas"), json!([object]), vec![from, to, data, value]);
        let result = self.request(call, code).await?;
        self.quantity_u64("estimateGas", code, &result)
    }

    pub async fn block_number(&self) -> SdkResult<u64> {
        let code = ErrorCode::RpcBlockNumber;
        let value = self.request(RpcCall::new(self.method("blockNumber"), Vec::new()), code).await?;
        self.quantity_u64("blockNumber", code, &value)
    }

    /// Block by height; `full` returns whole transactions instead of hashes.
    pub async fn get_block_by_number(&self, number: u64, full: bool) -> SdkResult<Value> {
        let number = to_quantity(U256::from(number));
        let call = RpcCall::structured(
            self.method("getBlockByNumber"),
            json!([number, full]),
            vec![number.clone(), full.to_string()],
        );
        self.request(call, ErrorCode::RpcGetBlockByNumber).await
    }

    pub async fn get_block_by_hash(&self, hash: B256, full: bool) -> SdkResult<Value> {
        let hash = format!("{:#x}", hash);
        let call = RpcCall::structured(
            self.method("getBlockByHash"),
            json!([hash, full]),
            vec![hash.clone(), full.to_string()],
        );
        self.request(call, ErrorCode::RpcGetBlockByHash).await
    }

    /// Transaction by hash, routed by the sender address.
    pub async fn get_transaction_by_hash(&self, from: Address, hash: B256) -> SdkResult<Value> {
        let call = RpcCall::new(self.method("getTransactionByHash"), vec![format!("{:#x}", hash)]).with_from(from.to_string());
        self.request(call, ErrorCode::RpcGetTransactionByHash).await
    }

    pub async fn get_transaction_receipt(&self, hash: B256) -> SdkResult<Value> {
        let call = RpcCall::new(self.method("getTransactionReceipt"), vec![format!("{:#x}", hash)]);
        self.request(call, ErrorCode::RpcGetTransactionReceipt).await
    }

    /// Submit a signed, encoded transaction (`0x`-prefixed hex).
    ///
    /// Retries re-send the same payload; the gateway de-duplicates by hash.
    pub async fn send_raw_transaction(&self, raw: &str) -> SdkResult<Value> {
        let call = RpcCall::new(self.method("sendRawTransaction"), vec![raw.to_string()]);
        self.request(call, ErrorCode::RpcSendTransaction).await
    }

    /// Submit a signed contract transaction with its extension metadata.
    pub async fn send_contract_transaction(&self, raw: &str, extension: &ContractExtension) -> SdkResult<Value> {
        let code = ErrorCode::RpcSendContractTransaction;
        let extension = serde_json::to_value(extension).map_err(|e| SdkError::transport(code, TransportError::Encode(e)))?;
        let call = RpcCall::new(self.method("sendRawTransaction"), vec![raw.to_string()]).with_extension(extension);
        self.request(call, code).await
    }

    /// Read-only contract call at the latest block.
    pub async fn call(&self, from: &str, to: &str, data: &str) -> SdkResult<Value> {
        let call = RpcCall::structured(
            self.method("call"),
            json!([{ "from": from, "to": to, "data": data }, "latest"]),
            vec![from.to_string(), to.to_string(), data.to_string()],
        );
        self.request(call, ErrorCode::Call).await
    }
}

impl ChainQuery for BaasClient {
    async fn estimate_gas(&self, from: Address, to: Option<Address>, data: &Bytes, value: U256) -> SdkResult<u64> {
        BaasClient::estimate_gas(self, from, to, data, value).await
    }

    async fn pending_nonce(&self, address: Address) -> SdkResult<u64> {
        self.get_transaction_count(address).await
    }
}
