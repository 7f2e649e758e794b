//! Bundler commands built on the runner and builder.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::subsystems::builder::{Builder, BuilderError};
use crate::subsystems::runner::{RunOptions, RunOutput, Runner, RunnerError};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Builder(#[from] BuilderError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("failed to remove {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Sources unchanged since the last successful build.
    Skipped { digest: String },
    Built { digest: String, success: bool },
}

pub struct Commands {
    config: Arc<Config>,
    builder: Arc<Builder>,
    runner: Arc<Runner>,
}

impl Commands {
    pub fn new(config: Arc<Config>, builder: Arc<Builder>, runner: Arc<Runner>) -> Self {
        Self {
            config,
            builder,
            runner,
        }
    }

    /// Run the bundler with `argv`, output inherited.
    pub async fn run(&self, argv: &[String]) -> Result<RunOutput, CommandError> {
        Ok(self.runner.run(argv, RunOptions::default()).await?)
    }

    /// Build when sources changed (or when forced) and record the outcome.
    pub async fn build(&self, force: bool) -> Result<BuildOutcome, CommandError> {
        let status = self.builder.refresh()?;
        if !status.stale && !force {
            tracing::info!(digest = %status.digest, "Skipping build, sources unchanged");
            return Ok(BuildOutcome::Skipped {
                digest: status.digest,
            });
        }

        let output = self
            .runner
            .run(&["build".to_string()], RunOptions::default())
            .await?;
        self.builder.record_build(&status.digest, output.success)?;

        Ok(BuildOutcome::Built {
            digest: status.digest,
            success: output.success,
        })
    }

    /// Remove built assets and the build cache. Returns the removed dirs.
    pub fn clobber(&self) -> Result<Vec<PathBuf>, CommandError> {
        let mut removed = Vec::new();
        for path in [self.config.public_output_path(), self.config.build_cache_path()] {
            if !path.exists() {
                continue;
            }
            fs::remove_dir_all(&path).map_err(|source| CommandError::Remove {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), "Removed");
            removed.push(path);
        }
        Ok(removed)
    }
}
