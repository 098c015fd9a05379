//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!
//! Consumers:
//!     → whatever subscriber / recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - Secrets (keys, passphrases) never reach a log line
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
