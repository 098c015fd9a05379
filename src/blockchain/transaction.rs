//! Transaction argument resolution and canonical encoding.
//!
//! # Responsibilities
//! - Fill missing gas price, value, gas and nonce, in that order
//! - Build the legacy transaction handed to the account provider
//! - Encode signed transactions for `sendRawTransaction`
//!
//! # Invariants
//! - Explicitly supplied fields are never overwritten
//! - The first failing lookup aborts resolution with its own code and message

use std::future::Future;
use std::sync::Arc;

use alloy::consensus::{Signed, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};

use crate::blockchain::fees::FeeState;
use crate::error::{ErrorCode, SdkError, SdkResult};

/// Most decimal digits a chain id may have to fit the sign parameter.
pub const MAX_CHAIN_ID_DIGITS: usize = 8;

/// Partially specified transaction as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxArgs {
    pub from: Address,
    /// `None` deploys a contract.
    pub to: Option<Address>,
    pub gas: Option<u64>,
    pub gas_price: Option<U256>,
    pub value: Option<U256>,
    pub data: Bytes,
    pub nonce: Option<u64>,
}

impl TxArgs {
    pub fn new(from: Address) -> Self {
        Self {
            from,
            ..Self::default()
        }
    }

    /// Whether every field needed to build a transaction is present.
    pub fn is_resolved(&self) -> bool {
        self.gas.is_some() && self.gas_price.is_some() && self.value.is_some() && self.nonce.is_some()
    }

    /// Legacy transaction for these (resolved) arguments, bound to `chain_param`.
    pub fn into_transaction(self, chain_param: u64, code: ErrorCode) -> SdkResult<TxLegacy> {
        let missing = |field: &str| SdkError::invalid(code, format!("{} is not resolved", field));
        let gas_price = self.gas_price.ok_or_else(|| missing("gasPrice"))?;
        let gas_price = u128::try_from(gas_price).map_err(|_| SdkError::invalid(code, "gasPrice overflows u128"))?;

        Ok(TxLegacy {
            chain_id: Some(chain_param),
            nonce: self.nonce.ok_or_else(|| missing("nonce"))?,
            gas_price,
            gas_limit: self.gas.ok_or_else(|| missing("gas"))?,
            to: self.to.map_or(TxKind::Create, TxKind::Call),
            value: self.value.ok_or_else(|| missing("value"))?,
            input: self.data,
        })
    }
}

/// Chain lookups needed to complete [`TxArgs`].
pub trait ChainQuery: Send + Sync {
    fn estimate_gas(
        &self,
        from: Address,
        to: Option<Address>,
        data: &Bytes,
        value: U256,
    ) -> impl Future<Output = SdkResult<u64>> + Send;

    /// Next nonce at the `pending` block tag.
    fn pending_nonce(&self, address: Address) -> impl Future<Output = SdkResult<u64>> + Send;
}

/// Fills the fields a caller left out.
#[derive(Debug, Clone)]
pub struct TxArgsResolver {
    default_gas_price: U256,
    fees: Arc<FeeState>,
}

impl TxArgsResolver {
    pub fn new(default_gas_price: U256, fees: Arc<FeeState>) -> Self {
        Self { default_gas_price, fees }
    }

    /// Gas price used when the caller gives none: the polled value, else the default.
    pub fn gas_price(&self) -> U256 {
        self.fees.gas_price().unwrap_or(self.default_gas_price)
    }

    pub async fn resolve<Q: ChainQuery>(&self, query: &Q, mut args: TxArgs) -> SdkResult<TxArgs> {
        if args.gas_price.is_none() {
            args.gas_price = Some(self.gas_price());
        }

        let value = *args.value.get_or_insert(U256::ZERO);

        if args.gas.is_none() {
            let gas = query.estimate_gas(args.from, args.to, &args.data, value).await?;
            tracing::debug!(from = %args.from, gas, "Estimated gas");
            args.gas = Some(gas);
        }

        if args.nonce.is_none() {
            let nonce = query.pending_nonce(args.from).await?;
            tracing::debug!(from = %args.from, nonce, "Fetched pending nonce");
            args.nonce = Some(nonce);
        }

        Ok(args)
    }
}

/// Chain id as signed into transactions: its decimal digits read as big-endian bytes.
///
/// Chain `1` signs as `0x31`, chain `30261` as `0x3330323631`.
pub fn chain_sign_param(chain_id: u64) -> SdkResult<u64> {
    let digits = chain_id.to_string();
    if digits.len() > MAX_CHAIN_ID_DIGITS {
        return Err(SdkError::invalid(
            ErrorCode::SignTx,
            format!("chain id {} has more than {} digits", chain_id, MAX_CHAIN_ID_DIGITS),
        ));
    }
    Ok(digits.bytes().fold(0u64, |acc, byte| (acc << 8) | u64::from(byte)))
}

/// Turns signed transactions into wire bytes.
pub trait TxCodec: Send + Sync {
    fn encode_canonical(&self, signed: &Signed<TxLegacy>) -> SdkResult<Vec<u8>>;

    fn hash(&self, signed: &Signed<TxLegacy>) -> B256;
}

/// EIP-2718 encoding of legacy transactions (plain RLP).
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyTxCodec;

impl TxCodec for LegacyTxCodec {
    fn encode_canonical(&self, signed: &Signed<TxLegacy>) -> SdkResult<Vec<u8>> {
        Ok(TxEnvelope::Legacy(signed.clone()).encoded_2718())
    }

    fn hash(&self, signed: &Signed<TxLegacy>) -> B256 {
        *signed.hash()
    }
}
