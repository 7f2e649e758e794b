//! Collaborator handles bound to one instance's configuration.
//!
//! # Data Flow
//! ```text
//! Instance (first access)
//!     → builder.rs   watched files, digest, last build metadata
//!     → runner.rs    bundler process, env = snapshot + exported config
//!     → commands.rs  run / build / clobber on top of runner + builder
//!     → manifest.rs  asset name → path, entries from a ManifestLoader
//! ```
//!
//! # Design Decisions
//! - Handles are built once per instance and replaced only by a reload
//! - Each handle holds an `Arc<Config>`, never a reference back to the instance

pub mod builder;
pub mod commands;
pub mod manifest;
pub mod runner;

pub use builder::{BuildMetadata, BuildStatus, Builder, BuilderError};
pub use commands::{BuildOutcome, CommandError, Commands};
pub use manifest::{Manifest, ManifestEntry, ManifestError, ManifestLoader, NoManifest};
pub use runner::{RunOptions, RunOutput, Runner, RunnerError};
