//! Transaction coordination subsystem.
//!
//! # Data Flow
//! ```text
//! TxArgs (from, to?, gas?, gasPrice?, value?, data, nonce?)
//!     → nonce.rs (per-address lock, only when nonce is absent)
//!     → transaction.rs (TxArgsResolver: gasPrice → value → gas → nonce)
//!     → keystore.rs (AccountProvider signs with the chain sign param)
//!     → transaction.rs (TxCodec: EIP-2718 bytes + hash)
//!     → rpc::BaasClient::send_raw_transaction
//!
//! fees.rs: FeePoller refreshes FeeState (schedule + gas price) in the background
//! ```
//!
//! # Security Constraints
//! - Private keys only from the environment or generated in memory
//! - Never log private keys or passphrases

pub mod fees;
pub mod keystore;
pub mod nonce;
pub mod transaction;

pub use fees::{FeePoller, FeeSchedule, FeeState};
pub use keystore::{AccountProvider, LocalKeystore};
pub use nonce::{NonceGuard, NonceLockTable};
pub use transaction::{chain_sign_param, ChainQuery, LegacyTxCodec, TxArgs, TxArgsResolver, TxCodec};
