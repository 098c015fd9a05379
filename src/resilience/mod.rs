//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! RpcTransport::call
//!     → retries.rs (RetryPolicy::run: attempt, classify, hook, back off)
//!         → on retryable failure: refresh hook (EndpointCache::force_refresh)
//!         → backoff.rs (delay before the next attempt, zero by default)
//! ```
//!
//! # Design Decisions
//! - Only transport failures are retried; gateway error replies never are
//! - The policy knows nothing about endpoints, the hook does
//! - `max_attempts` counts the first try

pub mod backoff;
pub mod retries;

pub use retries::{RetryPolicy, Retryable};
