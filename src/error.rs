//! Error taxonomy for the SDK.
//!
//! # Layers
//! ```text
//! TransportError  connection / status / empty body (retried), malformed JSON (not retried)
//! RpcError        well-formed gateway reply with error.code != 0 (never retried)
//! SdkError        what every public operation returns
//! ApiError        {code, message} pair handed across the API boundary
//! ```
//!
//! Numeric codes are stable: callers switch on them, so they never change meaning.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable numeric codes returned at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Success,
    Method,
    Params,
    AccountFind,
    RpcGetBalance,
    NewAccount,
    RpcGetNonce,
    SignTx,
    EncodeTx,
    RpcSendTransaction,
    SignTxWithPassphrase,
    ContractExtension,
    RpcSendContractTransaction,
    JsonUnmarshal,
    RpcGetTransactionByHash,
    RpcGetTransactionReceipt,
    SendTxArgs,
    RpcGetGasPrice,
    Call,
    RpcEstimateGas,
    RpcBlockNumber,
    RpcGetBlockByHash,
    RpcGetBlockByNumber,
    SignTxArgs,
    SendRawTransaction,
    RpcGetFee,
    RpcGetChainId,
}

impl ErrorCode {
    /// Numeric value sent to callers.
    pub fn code(self) -> i64 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::Method => -1000,
            ErrorCode::Params => -1001,
            ErrorCode::AccountFind => -1002,
            ErrorCode::RpcGetBalance => -1003,
            ErrorCode::NewAccount => -1004,
            ErrorCode::RpcGetNonce => -1005,
            ErrorCode::SignTx => -1006,
            ErrorCode::EncodeTx => -1007,
            ErrorCode::RpcSendTransaction => -1008,
            ErrorCode::SignTxWithPassphrase => -1009,
            ErrorCode::ContractExtension => -1012,
            ErrorCode::RpcSendContractTransaction => -1013,
            ErrorCode::JsonUnmarshal => -1018,
            ErrorCode::RpcGetTransactionByHash => -1019,
            ErrorCode::RpcGetTransactionReceipt => -1020,
            ErrorCode::SendTxArgs => -1021,
            ErrorCode::RpcGetGasPrice => -1022,
            ErrorCode::Call => -1023,
            ErrorCode::RpcEstimateGas => -1024,
            ErrorCode::RpcBlockNumber => -1025,
            ErrorCode::RpcGetBlockByHash => -1026,
            ErrorCode::RpcGetBlockByNumber => -1027,
            ErrorCode::SignTxArgs => -1028,
            ErrorCode::SendRawTransaction => -1029,
            ErrorCode::RpcGetFee => -1030,
            ErrorCode::RpcGetChainId => -1031,
        }
    }

    /// Human-readable prefix for errors carrying this code.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::Success => "success",
            ErrorCode::Method => "invalid method",
            ErrorCode::Params => "params err",
            ErrorCode::AccountFind => "find account err",
            ErrorCode::RpcGetBalance => "rpc getBalance err",
            ErrorCode::NewAccount => "new account err",
            ErrorCode::RpcGetNonce => "rpc getNonce err",
            ErrorCode::SignTx => "sign tx err",
            ErrorCode::EncodeTx => "encode tx err",
            ErrorCode::RpcSendTransaction => "rpc sendTransaction err",
            ErrorCode::SignTxWithPassphrase => "sign tx with passphrase err",
            ErrorCode::ContractExtension => "contract extension err",
            ErrorCode::RpcSendContractTransaction => "rpc sendContractTransaction err",
            ErrorCode::JsonUnmarshal => "json unmarshal err",
            ErrorCode::RpcGetTransactionByHash => "rpc getTransactionByHash err",
            ErrorCode::RpcGetTransactionReceipt => "rpc getTransactionReceipt err",
            ErrorCode::SendTxArgs => "send tx args err",
            ErrorCode::RpcGetGasPrice => "rpc getGasPrice err",
            ErrorCode::Call => "rpc call err",
            ErrorCode::RpcEstimateGas => "rpc estimateGas err",
            ErrorCode::RpcBlockNumber => "rpc blockNumber err",
            ErrorCode::RpcGetBlockByHash => "rpc getBlockByHash err",
            ErrorCode::RpcGetBlockByNumber => "rpc getBlockByNumber err",
            ErrorCode::SignTxArgs => "sign tx args err",
            ErrorCode::SendRawTransaction => "send raw transaction err",
            ErrorCode::RpcGetFee => "rpc getFee err",
            ErrorCode::RpcGetChainId => "rpc getChainId err",
        }
    }
}

/// Failures below the JSON-RPC layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request URL could not be assembled.
    #[error("invalid request url '{url}': {reason}")]
    Url { url: String, reason: String },

    /// The request envelope could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// Connection refused, reset, or timed out.
    #[error("http post to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The gateway answered with something other than 200.
    #[error("http post to {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The gateway answered 200 with nothing in it.
    #[error("http post to {url} returned an empty body")]
    EmptyBody { url: String },

    /// The body was not the JSON shape we expected.
    #[error("malformed response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The reply decoded but its `result` is not what the method returns.
    #[error("unexpected result for {method}: {value}")]
    UnexpectedResult { method: String, value: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransportError {
    /// Whether re-sending the same payload to a refreshed endpoint may help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Http { .. } | TransportError::Status { .. } | TransportError::EmptyBody { .. }
        )
    }
}

/// Application-level error carried in a well-formed JSON-RPC reply.
///
/// `code == 0` means success; the gateway sometimes sends a zeroed object instead
/// of omitting the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("rpc error {code}: {message}")]
pub struct RpcError {
    #[serde(default, deserialize_with = "crate::rpc::types::null_as_default")]
    pub code: i64,
    #[serde(default, deserialize_with = "crate::rpc::types::null_as_default")]
    pub message: String,
}

impl RpcError {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Error returned by every public SDK operation.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Transport or protocol failure while talking to the gateway.
    #[error("{} ({source})", .code.message())]
    Transport {
        code: ErrorCode,
        #[source]
        source: TransportError,
    },

    /// The gateway rejected the call; code and message are passed through.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Caller-supplied arguments are malformed. Detected before any network call.
    #[error("{} ({reason})", .code.message())]
    InvalidParams { code: ErrorCode, reason: String },

    /// The address is not held by the local account provider.
    #[error("find account err (unknown account {0})")]
    AccountNotFound(Address),

    /// Key handling or signing failed in the account provider.
    #[error("{} ({reason})", .code.message())]
    Wallet { code: ErrorCode, reason: String },

    /// The method name is not part of the API.
    #[error("invalid method ({0})")]
    MethodNotFound(String),
}

impl SdkError {
    pub fn transport(code: ErrorCode, source: TransportError) -> Self {
        SdkError::Transport { code, source }
    }

    pub fn invalid(code: ErrorCode, reason: impl std::fmt::Display) -> Self {
        SdkError::InvalidParams { code, reason: reason.to_string() }
    }

    pub fn wallet(code: ErrorCode, reason: impl std::fmt::Display) -> Self {
        SdkError::Wallet { code, reason: reason.to_string() }
    }

    /// Numeric code for the API boundary.
    pub fn code(&self) -> i64 {
        match self {
            SdkError::Transport { code, .. }
            | SdkError::InvalidParams { code, .. }
            | SdkError::Wallet { code, .. } => code.code(),
            SdkError::Rpc(err) => err.code,
            SdkError::AccountNotFound(_) => ErrorCode::AccountFind.code(),
            SdkError::MethodNotFound(_) => ErrorCode::Method.code(),
        }
    }

    /// True for failures the caller caused, as opposed to the network or gateway.
    pub fn is_validation(&self) -> bool {
        matches!(self, SdkError::InvalidParams { .. })
    }
}

/// Result type for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;

/// `{code, message}` pair returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: i64,
    pub message: String,
}

impl From<SdkError> for ApiError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::Rpc(rpc) => ApiError { code: rpc.code, message: rpc.message },
            other => ApiError { code: other.code(), message: other.to_string() },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error code: {}, msg: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
