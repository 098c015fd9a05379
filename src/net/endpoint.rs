//! Cached gateway address with failover.
//!
//! # Responsibilities
//! - Hand out the current gateway IPv4 address without blocking
//! - Re-resolve periodically and on demand after transport failures
//! - Never reselect an address that just failed while another exists
//!
//! # Invariants
//! - The cached address is either absent (dial the hostname) or an IPv4 literal
//! - Resolution failures never clear or replace a cached address
//! - The state lock is held only to read or swap the address, never across I/O

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::lifecycle::ShutdownSignal;
use crate::net::resolver::Resolve;
use crate::observability::metrics;

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A different address is now cached.
    Updated(Ipv4Addr),
    /// The cached address was still valid and kept.
    Unchanged,
    /// Resolution failed or yielded no IPv4 record; previous state kept.
    Failed,
    /// A forced refresh ran too recently; nothing was done.
    Debounced,
}

#[derive(Debug, Default)]
struct EndpointState {
    cached: Option<Ipv4Addr>,
    last_update: Option<Instant>,
}

/// Locally cached, periodically refreshed address for the gateway hostname.
pub struct EndpointCache {
    hostname: String,
    resolver: Arc<dyn Resolve>,
    refresh_interval: Duration,
    debounce: Duration,
    state: RwLock<EndpointState>,
    /// Time of the last forced refresh. Held across the forced lookup so
    /// concurrent failing callers queue behind one resolution.
    last_forced: Mutex<Option<Instant>>,
}

impl EndpointCache {
    pub fn new(
        hostname: impl Into<String>,
        refresh_interval: Duration,
        debounce: Duration,
        resolver: Arc<dyn Resolve>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            resolver,
            refresh_interval,
            debounce,
            state: RwLock::new(EndpointState::default()),
            last_forced: Mutex::new(None),
        }
    }

    /// Logical hostname, used for the `Host` header.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Cached IPv4 literal, if one has been resolved.
    pub fn cached_address(&self) -> Option<Ipv4Addr> {
        self.state.read().ok().and_then(|state| state.cached)
    }

    /// When the cached address was last confirmed or replaced.
    pub fn last_update(&self) -> Option<Instant> {
        self.state.read().ok().and_then(|state| state.last_update)
    }

    /// Host to dial: the cached address, or the raw hostname if none.
    pub fn get_address(&self) -> String {
        match self.cached_address() {
            Some(ip) => ip.to_string(),
            None => {
                tracing::debug!(host = %self.hostname, "No cached address, dialing hostname");
                self.hostname.clone()
            }
        }
    }

    /// Re-resolve, keeping the current address if it is still published.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.resolve_and_swap(false, "periodic").await
    }

    /// Re-resolve after a failure, excluding the current address.
    ///
    /// Calls within the debounce window of the previous forced refresh are no-ops.
    pub async fn force_refresh(&self) -> RefreshOutcome {
        let mut last_forced = self.last_forced.lock().await;
        if let Some(at) = *last_forced {
            if at.elapsed() < self.debounce {
                tracing::debug!(host = %self.hostname, "Forced refresh debounced");
                metrics::record_endpoint_refresh("forced", "debounced");
                return RefreshOutcome::Debounced;
            }
        }
        let outcome = self.resolve_and_swap(true, "forced").await;
        *last_forced = Some(Instant::now());
        outcome
    }

    async fn resolve_and_swap(&self, exclude_current: bool, trigger: &'static str) -> RefreshOutcome {
        let current = self.cached_address();

        let records = match self.resolver.lookup(&self.hostname).await {
            Ok(records) if !records.is_empty() => records,
            Ok(_) => {
                tracing::warn!(host = %self.hostname, "DNS lookup returned no records, keeping cached address");
                metrics::record_endpoint_refresh(trigger, "failed");
                return RefreshOutcome::Failed;
            }
            Err(e) => {
                tracing::error!(host = %self.hostname, error = %e, "DNS lookup failed, keeping cached address");
                metrics::record_endpoint_refresh(trigger, "failed");
                return RefreshOutcome::Failed;
            }
        };

        let mut ipv4: Vec<Ipv4Addr> = Vec::with_capacity(records.len());
        for record in records {
            match record {
                IpAddr::V4(ip) if !ipv4.contains(&ip) => ipv4.push(ip),
                IpAddr::V4(_) => {}
                IpAddr::V6(ip) => tracing::trace!(ip = %ip, "Skipping non-IPv4 record"),
            }
        }
        if ipv4.is_empty() {
            tracing::warn!(host = %self.hostname, "No IPv4 records, keeping cached address");
            metrics::record_endpoint_refresh(trigger, "failed");
            return RefreshOutcome::Failed;
        }

        let mut candidates: Vec<Ipv4Addr> = match (exclude_current, current) {
            (true, Some(bad)) => ipv4.iter().copied().filter(|ip| *ip != bad).collect(),
            _ => ipv4.clone(),
        };
        if candidates.is_empty() {
            tracing::warn!(host = %self.hostname, "Failed address is the only candidate, keeping it");
            candidates = ipv4;
        }

        if let Some(current) = current {
            if candidates.contains(&current) {
                if let Ok(mut state) = self.state.write() {
                    state.last_update = Some(Instant::now());
                }
                tracing::debug!(host = %self.hostname, ip = %current, "Cached address still valid");
                metrics::record_endpoint_refresh(trigger, "unchanged");
                return RefreshOutcome::Unchanged;
            }
        }

        let selected = candidates[fastrand::usize(..candidates.len())];
        match self.state.write() {
            Ok(mut state) => {
                state.cached = Some(selected);
                state.last_update = Some(Instant::now());
            }
            Err(_) => {
                tracing::error!(host = %self.hostname, "Endpoint state poisoned");
                return RefreshOutcome::Failed;
            }
        }

        tracing::info!(
            host = %self.hostname,
            previous = ?current,
            ip = %selected,
            trigger,
            "Gateway address updated"
        );
        metrics::record_endpoint_refresh(trigger, "updated");
        RefreshOutcome::Updated(selected)
    }

    /// Periodic refresh loop; runs until shutdown.
    pub async fn run(self: Arc<Self>, mut shutdown: ShutdownSignal) {
        if self.refresh_interval.is_zero() {
            tracing::warn!(host = %self.hostname, "Endpoint refresh interval is zero, not refreshing");
            return;
        }
        tracing::info!(
            host = %self.hostname,
            interval_secs = self.refresh_interval.as_secs(),
            "Endpoint refresh loop starting"
        );
        let start = tokio::time::Instant::now() + self.refresh_interval;
        let mut ticker = tokio::time::interval_at(start, self.refresh_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!(host = %self.hostname, "Endpoint refresh loop stopping");
                    break;
                }
            }
        }
    }
}

impl std::fmt::Debug for EndpointCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointCache")
            .field("hostname", &self.hostname)
            .field("cached", &self.cached_address())
            .field("refresh_interval", &self.refresh_interval)
            .finish()
    }
}
