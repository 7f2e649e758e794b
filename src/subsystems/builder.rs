//! Watched source files and build freshness.
//!
//! # Responsibilities
//! - Enumerate the files whose changes require a new build
//! - Digest them for change detection
//! - Persist the outcome of the last build per mode

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::Config;

/// Files at the root that always affect a build.
const DEFAULT_WATCHED_FILES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "vite.config.ts",
    "vite.config.js",
    "vite.config.mjs",
];

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid build metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Outcome of the last recorded build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMetadata {
    pub digest: String,
    pub success: bool,
    /// Seconds since the epoch.
    pub timestamp: u64,
}

/// Result of [`Builder::refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStatus {
    pub digest: String,
    /// True when the sources changed since the last successful build.
    pub stale: bool,
    pub last_build: Option<BuildMetadata>,
}

pub struct Builder {
    config: Arc<Config>,
}

impl Builder {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Existing watched files, relative to the root, sorted.
    pub fn watched_files(&self) -> Vec<PathBuf> {
        let root = &self.config.root;
        let mut entries: Vec<PathBuf> = DEFAULT_WATCHED_FILES
            .iter()
            .map(|name| PathBuf::from(*name))
            .collect();
        entries.push(PathBuf::from(&self.config.config_path));
        entries.push(PathBuf::from(&self.config.source_code_dir));
        entries.extend(self.config.watch_additional_paths.iter().map(PathBuf::from));

        let mut files = Vec::new();
        for entry in entries {
            let path = root.join(&entry);
            if path.is_file() {
                files.push(entry);
            } else if path.is_dir() {
                files.extend(
                    WalkDir::new(&path)
                        .into_iter()
                        .filter_map(Result::ok)
                        .filter(|e| e.file_type().is_file())
                        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf)),
                );
            }
        }

        files.sort();
        files.dedup();
        files
    }

    /// SHA-256 over every watched file's relative path and content.
    pub fn watched_files_digest(&self) -> Result<String, BuilderError> {
        let mut hasher = Sha256::new();

        for file in self.watched_files() {
            let path = self.config.root.join(&file);
            let content = fs::read(&path).map_err(|source| BuilderError::Io { path, source })?;

            hasher.update(file.to_string_lossy().as_bytes());
            hasher.update(b"\0");
            hasher.update(&content);
            hasher.update(b"\0");
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Recompute the digest and compare it with the last successful build.
    pub fn refresh(&self) -> Result<BuildStatus, BuilderError> {
        let digest = self.watched_files_digest()?;
        let last_build = self.last_build()?;
        let stale = !matches!(&last_build, Some(last) if last.success && last.digest == digest);

        tracing::debug!(digest = %digest, stale, "Watched files refreshed");
        Ok(BuildStatus {
            digest,
            stale,
            last_build,
        })
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.config
            .build_cache_path()
            .join(format!("last-build-{}.json", self.config.mode))
    }

    pub fn last_build(&self) -> Result<Option<BuildMetadata>, BuilderError> {
        let path = self.metadata_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|source| BuilderError::Io { path, source })?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn record_build(&self, digest: &str, success: bool) -> Result<BuildMetadata, BuilderError> {
        let metadata = BuildMetadata {
            digest: digest.to_string(),
            success,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        };

        let path = self.metadata_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| BuilderError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, serde_json::to_vec_pretty(&metadata)?)
            .map_err(|source| BuilderError::Io { path, source })?;

        tracing::info!(digest = %metadata.digest, success, "Build recorded");
        Ok(metadata)
    }
}
