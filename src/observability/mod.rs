//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (probe and reload counters via `metrics`)
//!
//! Consumers:
//!     → whatever subscriber/recorder the host installs
//!     → the `vite-bridge` binary installs the fmt subscriber
//! ```
//!
//! # Design Decisions
//! - The library never installs a global subscriber or recorder
//! - Metric updates are no-ops until the host installs a recorder

pub mod logging;
pub mod metrics;
