//! Invocation of the bundler executable.
//!
//! # Responsibilities
//! - Build the command line (argv plus `--mode`)
//! - Pass the prefixed environment snapshot and the resolved config through
//! - Run one process to completion; no supervision or restarts

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use thiserror::Error;
use tokio::process::Command;

use crate::config::Config;
use crate::environment::EnvSnapshot;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to run {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Variables added on top of the snapshot and the exported config.
    pub extra_env: BTreeMap<String, String>,
    /// Capture stdout/stderr instead of inheriting them.
    pub capture_output: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// Empty unless output was captured.
    pub stdout: String,
    pub stderr: String,
}

pub struct Runner {
    config: Arc<Config>,
    env: Arc<EnvSnapshot>,
}

impl Runner {
    pub fn new(config: Arc<Config>, env: Arc<EnvSnapshot>) -> Self {
        Self { config, env }
    }

    /// The executable: bare command names are looked up on PATH, anything
    /// with a separator is relative to the root.
    pub fn program(&self) -> PathBuf {
        let executable = PathBuf::from(&self.config.executable);
        if executable.components().count() > 1 {
            self.config.root.join(executable)
        } else {
            executable
        }
    }

    /// `argv` followed by `--mode {mode}` unless argv already selects a mode.
    pub fn args(&self, argv: &[String]) -> Vec<String> {
        let mut args = argv.to_vec();
        let has_mode = argv
            .iter()
            .any(|arg| arg == "--mode" || arg == "-m" || arg.starts_with("--mode="));
        if !has_mode {
            args.push("--mode".to_string());
            args.push(self.config.mode.clone());
        }
        args
    }

    /// Environment for the child: snapshot, then exported config, then extras.
    pub fn env(&self, extra: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut env = self.env.to_map();
        env.extend(self.config.to_env());
        env.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }

    pub async fn run(&self, argv: &[String], options: RunOptions) -> Result<RunOutput, RunnerError> {
        let program = self.program();
        let args = self.args(argv);

        tracing::info!(program = %program.display(), args = ?args, "Running bundler");

        let mut command = Command::new(&program);
        command
            .args(&args)
            .envs(self.env(&options.extra_env))
            .current_dir(&self.config.root)
            .stdin(Stdio::null());

        let spawn_error = |source| RunnerError::Spawn {
            program: program.clone(),
            source,
        };

        let output = if options.capture_output {
            let output = command.output().await.map_err(spawn_error)?;
            RunOutput {
                success: output.status.success(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
        } else {
            let status = command.status().await.map_err(spawn_error)?;
            RunOutput {
                success: status.success(),
                code: status.code(),
                stdout: String::new(),
                stderr: String::new(),
            }
        };

        if !output.success {
            tracing::warn!(program = %program.display(), code = ?output.code, "Bundler exited with failure");
        }
        Ok(output)
    }
}
