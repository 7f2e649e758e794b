//! Errors surfaced by the instance pass-through operations.

use thiserror::Error;

use crate::config::ConfigError;
use crate::subsystems::{BuilderError, CommandError, ManifestError, RunnerError};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Builder(#[from] BuilderError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Command(#[from] CommandError),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
