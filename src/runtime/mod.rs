//! Instance lifecycle.
//!
//! # Data Flow
//! ```text
//! Registry::instance()           (first access creates an Instance)
//!     → Instance::config()       (resolved once, then frozen)
//!     → Instance::builder() ...  (handles built once, cached)
//!     → Instance::dev_server_running() (policy + cached probe)
//!
//! Registry::reload(options)
//!     → new Instance (fresh env snapshot, empty caches)
//!     → atomic pointer swap
//!     → old Instance dropped with its last reader
//! ```

pub mod instance;
pub mod registry;

pub use instance::Instance;
pub use registry::{Registry, RegistryBuilder};
