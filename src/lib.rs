//! Client library for a BaaS JSON-RPC blockchain gateway.

// Core subsystems
pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod rpc;
pub mod sdk;

// Gateway plumbing
pub mod net;
pub mod resilience;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use api::{dispatch, ApiReply};
pub use blockchain::{AccountProvider, LegacyTxCodec, LocalKeystore, TxArgs, TxCodec};
pub use config::SdkConfig;
pub use error::{ApiError, ErrorCode, SdkError, SdkResult};
pub use sdk::Sdk;
