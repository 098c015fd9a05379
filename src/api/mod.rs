//! API boundary.
//!
//! # Data Flow
//! ```text
//! (method name, JSON params array)
//!     → dispatch.rs (arity check, method table)
//!     → args.rs (typed parse; malformed input → validation error, no network call)
//!     → Sdk operation
//!     → Result<Value, ApiError{code, message}>
//! ```

pub mod args;
pub mod dispatch;

pub use args::CallRequest;
pub use dispatch::{dispatch, ApiReply, METHODS};
