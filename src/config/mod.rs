//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! default providers (providers.rs: base, framework)
//!     → config file section (loader.rs: "all" + mode)
//!     → VITE_RUBY_* environment (loader.rs)
//!     → user options
//!     → resolver.rs (overlay, field by field)
//!     → validation.rs (semantic checks)
//!     → Config (validated, immutable)
//!     → shared via Arc to all subsystems of one instance
//!
//! On config file edit:
//!     watcher.rs detects change
//!     → loader.rs re-parses the file
//!     → reload request sent to the host
//!     → Registry::reload publishes a new instance
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; changes require a full reload
//! - Every field but `root` has a default, so minimal setups need no file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod providers;
pub mod resolver;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::ConfigError;
pub use providers::{AssetHost, DefaultProvider, HostFramework};
pub use resolver::ConfigResolver;
pub use schema::{Config, ConfigOptions, TagOptions};
