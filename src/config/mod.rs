//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! sdk.toml (+ optional auth.json)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SdkConfig (validated, immutable)
//!     → owned by the Sdk context object
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the credential lives for the process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AuthCredential, FeeConfig, GatewayConfig, KeystoreConfig, ObservabilityConfig, SdkConfig};
