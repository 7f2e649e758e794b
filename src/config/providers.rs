//! Default providers: the low-precedence layers of configuration.
//!
//! # Responsibilities
//! - Supply library defaults
//! - Supply host-framework defaults when a framework runtime is installed
//!
//! # Design Decisions
//! - A provider that has nothing to contribute returns `None`; that is never
//!   an error, the layer is skipped
//! - Providers are pure functions of the captured environment

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::schema::{
    ConfigOptions, TagOptions, DEFAULT_BUILD_CACHE_DIR, DEFAULT_CONFIG_PATH,
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_EXECUTABLE, DEFAULT_HOST, DEFAULT_HTTPS, DEFAULT_MODE, DEFAULT_PORT,
    DEFAULT_PUBLIC_DIR, DEFAULT_PUBLIC_OUTPUT_DIR, DEFAULT_SOURCE_CODE_DIR, TAG_OPTION_NAMES,
};
use crate::environment::ProcessEnv;

/// Variable naming the environment when no framework supplies one.
pub const RACK_ENV_VAR: &str = "RACK_ENV";

/// One layer of computed defaults.
pub trait DefaultProvider: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// The layer, or `None` when this provider does not apply.
    fn defaults(&self, env: &ProcessEnv) -> Option<ConfigOptions>;
}

/// Library defaults. Always applies.
#[derive(Debug, Default)]
pub struct BaseDefaults;

impl DefaultProvider for BaseDefaults {
    fn name(&self) -> &str {
        "base"
    }

    fn defaults(&self, env: &ProcessEnv) -> Option<ConfigOptions> {
        let root = match std::env::current_dir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                tracing::warn!(error = %e, "Unable to read the working directory");
                None
            }
        };

        Some(ConfigOptions {
            mode: Some(env.get(RACK_ENV_VAR).unwrap_or(DEFAULT_MODE).to_string()),
            root,
            config_path: Some(DEFAULT_CONFIG_PATH.to_string()),
            host: Some(DEFAULT_HOST.to_string()),
            port: Some(DEFAULT_PORT),
            https: Some(DEFAULT_HTTPS),
            public_dir: Some(DEFAULT_PUBLIC_DIR.to_string()),
            public_output_dir: Some(DEFAULT_PUBLIC_OUTPUT_DIR.to_string()),
            source_code_dir: Some(DEFAULT_SOURCE_CODE_DIR.to_string()),
            build_cache_dir: Some(DEFAULT_BUILD_CACHE_DIR.to_string()),
            watch_additional_paths: Some(Vec::new()),
            dev_server_connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT_SECS),
            asset_host: None,
            executable: Some(DEFAULT_EXECUTABLE.to_string()),
            tag_options: empty_tag_options(TAG_OPTION_NAMES.iter().copied()),
        })
    }
}

/// Asset host as configured by the host framework.
#[derive(Clone)]
pub enum AssetHost {
    Static(String),
    /// Computed per request (e.g. a callable); cannot be stored in a static config.
    Dynamic(Arc<dyn Fn(&str) -> Option<String> + Send + Sync>),
}

impl fmt::Debug for AssetHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetHost::Static(host) => f.debug_tuple("Static").field(host).finish(),
            AssetHost::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// The web framework hosting the bridge, as far as configuration cares.
pub trait HostFramework: Send + Sync {
    fn name(&self) -> &str;

    /// Environment name, e.g. "development".
    fn environment(&self) -> Option<String>;

    /// Application root, if the framework knows it.
    fn root(&self) -> Option<PathBuf>;

    fn asset_host(&self) -> Option<AssetHost> {
        None
    }

    /// Tag-option maps the framework's helpers read.
    fn tag_option_names(&self) -> Vec<String> {
        TAG_OPTION_NAMES.iter().map(|name| name.to_string()).collect()
    }
}

/// Framework defaults. Skipped when no framework runtime is present.
#[derive(Default)]
pub struct FrameworkDefaults {
    runtime: Option<Arc<dyn HostFramework>>,
}

impl FrameworkDefaults {
    pub fn new(runtime: Option<Arc<dyn HostFramework>>) -> Self {
        Self { runtime }
    }
}

impl DefaultProvider for FrameworkDefaults {
    fn name(&self) -> &str {
        self.runtime.as_ref().map_or("framework", |runtime| runtime.name())
    }

    fn defaults(&self, _env: &ProcessEnv) -> Option<ConfigOptions> {
        let runtime = self.runtime.as_ref()?;

        let asset_host = match runtime.asset_host() {
            Some(AssetHost::Static(host)) => Some(host),
            Some(AssetHost::Dynamic(_)) => {
                tracing::debug!(
                    framework = runtime.name(),
                    "Dynamic asset host cannot be stored in config, ignoring"
                );
                None
            }
            None => None,
        };

        let names = runtime.tag_option_names();
        Some(ConfigOptions {
            mode: runtime.environment(),
            root: runtime.root(),
            asset_host,
            tag_options: empty_tag_options(names.iter().map(String::as_str)),
            ..Default::default()
        })
    }
}

fn empty_tag_options<'a>(
    names: impl Iterator<Item = &'a str>,
) -> std::collections::BTreeMap<String, TagOptions> {
    names.map(|name| (name.to_string(), TagOptions::new())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Framework {
        asset_host: Option<AssetHost>,
    }

    impl HostFramework for Framework {
        fn name(&self) -> &str {
            "rails"
        }

        fn environment(&self) -> Option<String> {
            Some("production".into())
        }

        fn root(&self) -> Option<PathBuf> {
            Some(PathBuf::from("/srv/rails"))
        }

        fn asset_host(&self) -> Option<AssetHost> {
            self.asset_host.clone()
        }

        fn tag_option_names(&self) -> Vec<String> {
            vec!["javascript_tag_options".into(), "preload_tag_options".into()]
        }
    }

    #[test]
    fn test_base_defaults_read_rack_env() {
        let env: ProcessEnv = [("RACK_ENV", "test")].into_iter().collect();
        let layer = BaseDefaults.defaults(&env).unwrap();
        assert_eq!(layer.mode.as_deref(), Some("test"));
        assert_eq!(layer.port, Some(DEFAULT_PORT));

        let layer = BaseDefaults.defaults(&ProcessEnv::default()).unwrap();
        assert_eq!(layer.mode.as_deref(), Some("development"));
    }

    #[test]
    fn test_absent_framework_is_skipped() {
        let provider = FrameworkDefaults::new(None);
        assert!(provider.defaults(&ProcessEnv::default()).is_none());
    }

    #[test]
    fn test_framework_layer() {
        let provider = FrameworkDefaults::new(Some(Arc::new(Framework {
            asset_host: Some(AssetHost::Static("https://cdn.example.com".into())),
        })));
        let layer = provider.defaults(&ProcessEnv::default()).unwrap();

        assert_eq!(provider.name(), "rails");
        assert_eq!(layer.mode.as_deref(), Some("production"));
        assert_eq!(layer.root, Some(PathBuf::from("/srv/rails")));
        assert_eq!(layer.asset_host.as_deref(), Some("https://cdn.example.com"));
        assert!(layer.tag_options["preload_tag_options"].is_empty());
        assert!(layer.host.is_none());
    }

    #[test]
    fn test_dynamic_asset_host_is_dropped() {
        let provider = FrameworkDefaults::new(Some(Arc::new(Framework {
            asset_host: Some(AssetHost::Dynamic(Arc::new(|_source: &str| {
                Some("https://cdn1.example.com".to_string())
            }))),
        })));
        let layer = provider.defaults(&ProcessEnv::default()).unwrap();
        assert!(layer.asset_host.is_none());
    }
}
