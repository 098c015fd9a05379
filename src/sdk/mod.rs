//! SDK context object.
//!
//! # Data Flow
//! ```text
//! Sdk::new(config, accounts, codec)
//!     → validate_config → EndpointCache (initial resolve) → RpcTransport → BaasClient
//!     → getBaasSdkConf → chain id → chain sign param
//!     → FeeState (first poll when enabled)
//!     → spawn endpoint refresh loop + fee poll loop
//!
//! operations.rs: every public operation borrows the Sdk
//! ```
//!
//! # Design Decisions
//! - One Sdk owns every piece of mutable client state; nothing is global
//! - Several Sdks with different gateways can live in one process
//! - Dropping the Sdk stops its background tasks

mod operations;

use std::sync::Arc;

use alloy::primitives::U256;

use crate::blockchain::{
    chain_sign_param, AccountProvider, FeePoller, FeeState, NonceLockTable, TxArgsResolver, TxCodec,
};
use crate::config::validation::validate_config;
use crate::config::SdkConfig;
use crate::error::{ErrorCode, SdkError, SdkResult};
use crate::lifecycle::Shutdown;
use crate::net::{EndpointCache, Resolve, SystemResolver};
use crate::rpc::{BaasClient, RpcTransport};

pub struct Sdk {
    config: SdkConfig,
    client: BaasClient,
    endpoint: Arc<EndpointCache>,
    accounts: Arc<dyn AccountProvider>,
    codec: Arc<dyn TxCodec>,
    fees: Arc<FeeState>,
    resolver: TxArgsResolver,
    nonce_locks: NonceLockTable,
    chain_id: u64,
    chain_param: u64,
    shutdown: Shutdown,
}

impl Sdk {
    /// Connect using the system DNS resolver.
    pub async fn new(
        config: SdkConfig,
        accounts: Arc<dyn AccountProvider>,
        codec: Arc<dyn TxCodec>,
    ) -> SdkResult<Self> {
        Self::with_resolver(config, accounts, codec, Arc::new(SystemResolver)).await
    }

    /// Connect resolving the gateway hostname through `resolver`.
    pub async fn with_resolver(
        config: SdkConfig,
        accounts: Arc<dyn AccountProvider>,
        codec: Arc<dyn TxCodec>,
        resolver: Arc<dyn Resolve>,
    ) -> SdkResult<Self> {
        validate_config(&config).map_err(|errors| {
            let reasons: Vec<String> = errors.iter().map(ToString::to_string).collect();
            SdkError::invalid(ErrorCode::Params, reasons.join(", "))
        })?;

        let gateway = &config.gateway;
        let endpoint = Arc::new(EndpointCache::new(
            gateway.host.clone(),
            gateway.dns_refresh_interval(),
            gateway.force_refresh_debounce(),
            resolver,
        ));
        endpoint.refresh().await;

        let transport = RpcTransport::new(gateway, config.auth.clone(), endpoint.clone())
            .map_err(|e| SdkError::transport(ErrorCode::RpcGetChainId, e))?;
        let client = BaasClient::new(Arc::new(transport), gateway.namespace.clone());

        let chain_id = client.get_chain_id().await?;
        let chain_param = chain_sign_param(chain_id)?;

        let fees = Arc::new(FeeState::default());
        let poller = FeePoller::new(client.clone(), fees.clone(), config.fees.clone());
        if poller.is_enabled() {
            poller.poll_once().await;
        }

        let resolver = TxArgsResolver::new(U256::from(config.fees.default_gas_price), fees.clone());

        let shutdown = Shutdown::new();
        tokio::spawn(endpoint.clone().run(shutdown.subscribe()));
        tokio::spawn(poller.run(shutdown.subscribe()));

        tracing::info!(
            host = %gateway.host,
            namespace = %gateway.namespace,
            chain_id,
            accounts = accounts.accounts().len(),
            "SDK ready"
        );

        Ok(Self {
            config,
            client,
            endpoint,
            accounts,
            codec,
            fees,
            resolver,
            nonce_locks: NonceLockTable::new(),
            chain_id,
            chain_param,
            shutdown,
        })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn client(&self) -> &BaasClient {
        &self.client
    }

    pub fn endpoint(&self) -> &Arc<EndpointCache> {
        &self.endpoint
    }

    pub fn fees(&self) -> &Arc<FeeState> {
        &self.fees
    }

    /// Per-account locks serializing nonce assignment during submission.
    pub fn nonce_locks(&self) -> &NonceLockTable {
        &self.nonce_locks
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Chain id as signed into transactions.
    pub fn chain_param(&self) -> u64 {
        self.chain_param
    }

    /// Stop the background refresh tasks. Idempotent.
    pub fn shutdown(&self) {
        if !self.shutdown.is_triggered() {
            tracing::info!("SDK shutting down");
            self.shutdown.trigger();
        }
    }
}

impl Drop for Sdk {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Sdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sdk")
            .field("endpoint", &self.endpoint)
            .field("chain_id", &self.chain_id)
            .field("nonce_locks", &self.nonce_locks.len())
            .finish()
    }
}
