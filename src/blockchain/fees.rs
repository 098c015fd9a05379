//! Service fee schedule and gas price cache.
//!
//! # Responsibilities
//! - Compute the service fee for a transfer amount
//! - Hold the latest fee schedule and gas price for lock-free reads
//! - Poll the gateway for both on a fixed interval
//!
//! # Invariants
//! - Partial units round up: any nonzero remainder adds one whole unit
//! - `max == 0` means no upper bound
//! - A failed poll keeps the previous values

use std::sync::Arc;

use alloy::primitives::U256;
use arc_swap::{ArcSwap, ArcSwapOption};

use crate::config::FeeConfig;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::rpc::BaasClient;

/// Wei per whole unit.
pub const WEI_PER_UNIT: u64 = 1_000_000_000_000_000_000;

/// Multiplier applied after the rate.
pub const FEE_SCALE: u64 = 100;

/// Divisor applied to gateway-reported fee bounds.
pub const BOUND_DIVISOR: u64 = 100_000_000_000;

/// Bounds and rate for the service fee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeSchedule {
    pub min: U256,
    /// Zero means unbounded.
    pub max: U256,
    pub rate: i64,
}

impl FeeSchedule {
    pub fn new(min: U256, max: U256, rate: i64) -> Self {
        Self { min, max, rate }
    }

    /// Schedule from the raw `getFee` reply, whose bounds are scaled by 1e11.
    pub fn from_gateway(min: U256, max: U256, rate: i64) -> Self {
        let divisor = U256::from(BOUND_DIVISOR);
        Self {
            min: min / divisor,
            max: max / divisor,
            rate,
        }
    }

    /// Fee for transferring `amount` wei.
    pub fn fee(&self, amount: U256) -> U256 {
        let (mut units, remainder) = amount.div_rem(U256::from(WEI_PER_UNIT));
        if !remainder.is_zero() {
            units += U256::from(1u64);
        }

        // Negative rates are treated as zero.
        let rate = U256::from(self.rate.max(0) as u64);
        let mut fee = units.saturating_mul(rate).saturating_mul(U256::from(FEE_SCALE));

        if fee < self.min {
            fee = self.min;
        }
        if !self.max.is_zero() && fee > self.max {
            fee = self.max;
        }
        fee
    }
}

/// Latest fee schedule and polled gas price, shared with request paths.
#[derive(Debug)]
pub struct FeeState {
    schedule: ArcSwap<FeeSchedule>,
    gas_price: ArcSwapOption<U256>,
}

impl FeeState {
    pub fn new(schedule: FeeSchedule) -> Self {
        Self {
            schedule: ArcSwap::from_pointee(schedule),
            gas_price: ArcSwapOption::const_empty(),
        }
    }

    pub fn schedule(&self) -> FeeSchedule {
        self.schedule.load().as_ref().clone()
    }

    pub fn set_schedule(&self, schedule: FeeSchedule) {
        self.schedule.store(Arc::new(schedule));
    }

    /// Gas price from the most recent successful poll.
    pub fn gas_price(&self) -> Option<U256> {
        self.gas_price.load_full().map(|price| *price)
    }

    pub fn set_gas_price(&self, price: U256) {
        self.gas_price.store(Some(Arc::new(price)));
    }

    pub fn fee(&self, amount: U256) -> U256 {
        self.schedule.load().fee(amount)
    }
}

impl Default for FeeState {
    fn default() -> Self {
        Self::new(FeeSchedule::default())
    }
}

/// Background refresher for [`FeeState`].
pub struct FeePoller {
    client: BaasClient,
    state: Arc<FeeState>,
    config: FeeConfig,
}

impl FeePoller {
    pub fn new(client: BaasClient, state: Arc<FeeState>, config: FeeConfig) -> Self {
        Self { client, state, config }
    }

    /// Whether polling has anything to do.
    pub fn is_enabled(&self) -> bool {
        self.config.fetch_gas_price || self.config.fetch_fee
    }

    /// One refresh of whatever is enabled. Failures keep the previous values.
    pub async fn poll_once(&self) {
        if self.config.fetch_fee {
            match self.client.get_fee().await {
                Ok(schedule) => {
                    tracing::debug!(min = %schedule.min, max = %schedule.max, rate = schedule.rate, "Fee schedule updated");
                    self.state.set_schedule(schedule);
                }
                Err(e) => tracing::warn!(error = %e, "Fee poll failed, keeping previous schedule"),
            }
        }

        if self.config.fetch_gas_price {
            match self.client.gas_price().await {
                Ok(price) => {
                    tracing::debug!(gas_price = %price, "Gas price updated");
                    metrics::record_gas_price(price.saturating_to::<u128>() as f64);
                    self.state.set_gas_price(price);
                }
                Err(e) => tracing::warn!(error = %e, "Gas price poll failed, keeping previous value"),
            }
        }
    }

    /// Poll on the configured interval until shutdown.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        if !self.is_enabled() {
            tracing::debug!("Fee polling disabled");
            return;
        }

        let period = self.config.poll_interval();
        if period.is_zero() {
            tracing::warn!("Fee poll interval is zero, not polling");
            return;
        }
        tracing::info!(interval_secs = period.as_secs(), "Fee poll loop starting");
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Fee poll loop stopping");
                    break;
                }
            }
        }
    }
}
