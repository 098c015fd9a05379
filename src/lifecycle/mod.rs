//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Sdk::new
//!     → spawn endpoint refresh loop (net::endpoint)
//!     → spawn fee / gas price poll loop (blockchain::fees)
//!     both hold a ShutdownSignal
//!
//! Sdk::shutdown / drop
//!     → Shutdown::trigger → loops observe the signal and exit
//! ```

pub mod shutdown;

pub use shutdown::{Shutdown, ShutdownSignal};
