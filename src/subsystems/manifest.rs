//! Asset name lookups.
//!
//! The manifest format itself is parsed elsewhere; this handle only caches
//! whatever entries its [`ManifestLoader`] returns and turns names into paths.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no manifest entry for {0}")]
    MissingEntry(String),

    #[error("failed to load manifest: {0}")]
    Load(String),
}

/// A built asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Output file, relative to the public output dir.
    pub file: String,
    #[serde(default)]
    pub css: Vec<String>,
    #[serde(default)]
    pub imports: Vec<String>,
}

pub type ManifestEntries = HashMap<String, ManifestEntry>;

/// Source of manifest entries.
pub trait ManifestLoader: Send + Sync {
    fn load(&self, config: &Config) -> Result<ManifestEntries, ManifestError>;
}

/// Loader used when the host provides none: contributes no entries.
#[derive(Debug, Default)]
pub struct NoManifest;

impl ManifestLoader for NoManifest {
    fn load(&self, _config: &Config) -> Result<ManifestEntries, ManifestError> {
        Ok(ManifestEntries::new())
    }
}

pub struct Manifest {
    config: Arc<Config>,
    loader: Arc<dyn ManifestLoader>,
    entries: ArcSwapOption<ManifestEntries>,
}

impl Manifest {
    pub fn new(config: Arc<Config>, loader: Arc<dyn ManifestLoader>) -> Self {
        Self {
            config,
            loader,
            entries: ArcSwapOption::empty(),
        }
    }

    /// Reload entries. Readers see either the old or the new set, never a mix.
    pub fn refresh(&self) -> Result<usize, ManifestError> {
        let entries = self.loader.load(&self.config)?;
        let count = entries.len();
        self.entries.store(Some(Arc::new(entries)));
        tracing::debug!(entries = count, "Manifest refreshed");
        Ok(count)
    }

    /// Entry for `name`, loading the manifest on first use.
    pub fn lookup(&self, name: &str) -> Result<Option<ManifestEntry>, ManifestError> {
        if self.entries.load().is_none() {
            self.refresh()?;
        }
        let entries = self.entries.load_full();
        Ok(entries.and_then(|entries| entries.get(name).cloned()))
    }

    /// Public path for `name`.
    ///
    /// While the dev server is running assets are served by it, so the path
    /// points under the output dir without consulting the manifest.
    pub fn path_for(&self, name: &str, dev_server_running: bool) -> Result<String, ManifestError> {
        let output_dir = self.config.public_output_dir.trim_matches('/');
        if dev_server_running {
            return Ok(format!("/{}/{}", output_dir, name.trim_start_matches('/')));
        }

        let entry = self
            .lookup(name)?
            .ok_or_else(|| ManifestError::MissingEntry(name.to_string()))?;
        let prefix = self
            .config
            .asset_host
            .as_deref()
            .map(|host| host.trim_end_matches('/'))
            .unwrap_or_default();
        Ok(format!("{}/{}/{}", prefix, output_dir, entry.file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl ManifestLoader for CountingLoader {
        fn load(&self, _config: &Config) -> Result<ManifestEntries, ManifestError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok([(
                "entrypoints/application.js".to_string(),
                ManifestEntry {
                    file: "assets/application-abc123.js".into(),
                    css: vec![],
                    imports: vec![],
                },
            )]
            .into_iter()
            .collect())
        }
    }

    fn manifest(asset_host: Option<&str>) -> (Manifest, Arc<CountingLoader>) {
        let config = Config::from_options(ConfigOptions {
            root: Some("/srv/app".into()),
            asset_host: asset_host.map(str::to_string),
            ..Default::default()
        })
        .unwrap();
        let loader = Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
        });
        (Manifest::new(Arc::new(config), loader.clone()), loader)
    }

    #[test]
    fn test_lookup_loads_once() {
        let (manifest, loader) = manifest(None);

        assert!(manifest.lookup("entrypoints/application.js").unwrap().is_some());
        assert!(manifest.lookup("missing.js").unwrap().is_none());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);

        assert_eq!(manifest.refresh().unwrap(), 1);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_path_for() {
        let (manifest, _) = manifest(Some("https://cdn.example.com/"));

        assert_eq!(
            manifest.path_for("entrypoints/application.js", true).unwrap(),
            "/vite/entrypoints/application.js"
        );
        assert_eq!(
            manifest.path_for("entrypoints/application.js", false).unwrap(),
            "https://cdn.example.com/vite/assets/application-abc123.js"
        );
        assert!(matches!(
            manifest.path_for("missing.js", false),
            Err(ManifestError::MissingEntry(_))
        ));
    }

    #[test]
    fn test_default_loader_is_empty() {
        let config = Config::from_options(ConfigOptions {
            root: Some("/srv/app".into()),
            ..Default::default()
        })
        .unwrap();
        let manifest = Manifest::new(Arc::new(config), Arc::new(NoManifest));
        assert_eq!(manifest.refresh().unwrap(), 0);
        assert_eq!(
            manifest.path_for("app.js", true).unwrap(),
            "/vite/app.js"
        );
    }
}
