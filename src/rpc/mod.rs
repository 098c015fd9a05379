//! Gateway RPC subsystem.
//!
//! # Data Flow
//! ```text
//! BaasClient::<operation>
//!     → transport.rs (RpcCall → envelope, signed once)
//!         → auth.rs (nonce + params + credential → sha256 → md5)
//!         → EndpointCache::get_address → POST {protocol}://{ip}/{verb}?from=
//!         → RetryPolicy (force_refresh after each transport failure)
//!     → types.rs (RpcResponse, error.code != 0 → RpcError)
//! ```
//!
//! # Design Decisions
//! - `Host` is always the logical gateway hostname, even when dialing an IP
//! - Auth may cover different strings than the structured params sent
//! - Gateway error replies are outcomes, not failures: never retried

pub mod auth;
pub mod client;
pub mod transport;
pub mod types;

pub use auth::AuthSigner;
pub use client::BaasClient;
pub use transport::{RpcCall, RpcTransport};
pub use types::{AuthToken, ContractExtension, RpcRequest, RpcResponse};
