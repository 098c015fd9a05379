//! Network address subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway hostname
//!     → resolver.rs (system DNS or a pinned record set)
//!     → endpoint.rs (filter IPv4, exclude failed address, pick at random)
//!     → cached IPv4 literal handed to the RPC transport
//!
//! Refresh triggers:
//!     periodic tick        → keep current address if still published
//!     transport failure    → force_refresh (debounced, excludes current)
//! ```
//!
//! # Design Decisions
//! - Stale-but-valid beats failing the caller: lookup errors are logged only
//! - Random pick spreads load across gateway replicas
//! - Debounce stops a burst of failing callers from re-resolving in a storm

pub mod endpoint;
pub mod resolver;

pub use endpoint::{EndpointCache, RefreshOutcome};
pub use resolver::{Resolve, StaticResolver, SystemResolver};
