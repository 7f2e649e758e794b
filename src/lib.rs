//! Coordination between a web application and a Vite dev server.
//!
//! Resolves the bridge configuration from layered defaults, keeps one
//! [`Instance`] of it per [`Registry`], and answers whether asset requests
//! should be proxied to a live dev server.

pub mod config;
pub mod dev_server;
pub mod environment;
pub mod error;
pub mod observability;
pub mod runtime;
pub mod subsystems;

pub use config::{Config, ConfigError, ConfigOptions, ConfigResolver, HostFramework};
pub use environment::{EnvSnapshot, ProcessEnv, ENV_PREFIX};
pub use error::{BridgeError, BridgeResult};
pub use runtime::{Instance, Registry};
