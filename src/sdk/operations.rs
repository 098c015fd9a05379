//! Public SDK operations.

use alloy::consensus::{Signed, TxLegacy};
use alloy::primitives::{Address, B256, U256};
use serde_json::Value;

use crate::api::args::CallRequest;
use crate::blockchain::TxArgs;
use crate::error::{ErrorCode, SdkError, SdkResult};
use crate::rpc::ContractExtension;
use crate::sdk::Sdk;

impl Sdk {
    /// Create a local account protected by `passphrase`.
    pub fn new_account(&self, passphrase: &str) -> SdkResult<Address> {
        self.accounts.new_account(passphrase)
    }

    pub fn accounts(&self) -> Vec<Address> {
        self.accounts.accounts()
    }

    pub async fn get_balance(&self, address: Address) -> SdkResult<U256> {
        self.accounts.find(address)?;
        self.client.get_balance(address).await
    }

    pub async fn get_transaction_count(&self, address: Address) -> SdkResult<u64> {
        self.accounts.find(address)?;
        self.client.get_transaction_count(address).await
    }

    pub async fn block_number(&self) -> SdkResult<u64> {
        self.client.block_number().await
    }

    pub async fn get_transaction_by_hash(&self, from: Address, hash: B256) -> SdkResult<Value> {
        self.accounts.find(from)?;
        self.client.get_transaction_by_hash(from, hash).await
    }

    pub async fn get_transaction_receipt(&self, hash: B256) -> SdkResult<Value> {
        self.client.get_transaction_receipt(hash).await
    }

    pub async fn get_block_by_number(&self, number: u64, full: bool) -> SdkResult<Value> {
        self.client.get_block_by_number(number, full).await
    }

    pub async fn get_block_by_hash(&self, hash: B256, full: bool) -> SdkResult<Value> {
        self.client.get_block_by_hash(hash, full).await
    }

    /// Resolve, sign and submit a transfer or contract call. Returns the transaction hash.
    pub async fn send_transaction(&self, args: TxArgs, passphrase: Option<&str>) -> SdkResult<B256> {
        self.submit(args, passphrase, None).await
    }

    /// Like [`Sdk::send_transaction`], attaching contract extension metadata when given.
    pub async fn send_contract_transaction(
        &self,
        args: TxArgs,
        passphrase: Option<&str>,
        extension: Option<&ContractExtension>,
    ) -> SdkResult<B256> {
        self.submit(args, passphrase, extension).await
    }

    /// Read-only contract call from a local account.
    pub async fn call(&self, request: &CallRequest) -> SdkResult<Value> {
        self.accounts.find(request.from)?;
        self.client
            .call(&request.from.to_string(), &request.to, &request.data)
            .await
    }

    /// Sign without submitting. The nonce must be supplied; returns `0x`-hex raw bytes.
    pub async fn sign_tx(&self, args: TxArgs) -> SdkResult<String> {
        let code = ErrorCode::SignTxArgs;
        if args.nonce.is_none() {
            return Err(SdkError::invalid(code, "nonce should not be nil"));
        }
        self.accounts.find(args.from)?;

        let args = self.resolver.resolve(&self.client, args).await?;
        let from = args.from;
        let tx = args.into_transaction(self.chain_param, code)?;
        let signed = self
            .accounts
            .sign_transaction(from, tx, self.chain_param)
            .map_err(|e| SdkError::wallet(code, e))?;
        let raw = self.codec.encode_canonical(&signed).map_err(|e| SdkError::wallet(code, e))?;
        Ok(alloy::hex::encode_prefixed(raw))
    }

    /// Submit an already signed transaction.
    pub async fn send_raw_transaction(&self, raw: &str) -> SdkResult<Value> {
        if raw.trim().is_empty() {
            return Err(SdkError::invalid(ErrorCode::SendRawTransaction, "raw transaction is empty"));
        }
        self.client.send_raw_transaction(raw).await
    }

    /// Service fee for transferring `amount` wei under the current schedule.
    pub fn service_fee(&self, amount: U256) -> U256 {
        self.fees.fee(amount)
    }

    async fn submit(
        &self,
        args: TxArgs,
        passphrase: Option<&str>,
        extension: Option<&ContractExtension>,
    ) -> SdkResult<B256> {
        let from = args.from;
        self.accounts.find(from)?;

        // Held from the nonce lookup until the gateway has the transaction.
        let _guard = match args.nonce {
            Some(_) => None,
            None => Some(self.nonce_locks.acquire(from).await),
        };

        let args = self.resolver.resolve(&self.client, args).await?;
        let tx = args.into_transaction(self.chain_param, ErrorCode::SendTxArgs)?;
        let nonce = tx.nonce;
        let signed = self.sign(from, passphrase, tx)?;

        let raw = self.codec.encode_canonical(&signed)?;
        let raw = alloy::hex::encode_prefixed(raw);
        let local_hash = self.codec.hash(&signed);

        let result = match extension {
            Some(extension) => self.client.send_contract_transaction(&raw, extension).await?,
            None => self.client.send_raw_transaction(&raw).await?,
        };

        let hash = result
            .as_str()
            .and_then(|text| text.parse::<B256>().ok())
            .unwrap_or(local_hash);
        tracing::info!(from = %from, nonce, hash = %hash, contract = extension.is_some(), "Transaction submitted");
        Ok(hash)
    }

    fn sign(&self, from: Address, passphrase: Option<&str>, tx: TxLegacy) -> SdkResult<Signed<TxLegacy>> {
        match passphrase {
            Some(passphrase) => self
                .accounts
                .sign_transaction_with_passphrase(from, passphrase, tx, self.chain_param),
            None => self.accounts.sign_transaction(from, tx, self.chain_param),
        }
    }
}
