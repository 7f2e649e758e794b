//! Layered configuration resolution.
//!
//! Precedence, lowest first:
//! default providers (in registration order) → config file → `VITE_RUBY_*`
//! environment → user options.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::loader::{load_file_options, options_from_env, ConfigError};
use crate::config::providers::{BaseDefaults, DefaultProvider, FrameworkDefaults, HostFramework};
use crate::config::schema::{Config, ConfigOptions, DEFAULT_CONFIG_PATH, DEFAULT_MODE};
use crate::config::validation::validate_config;
use crate::environment::ProcessEnv;

/// Merges an ordered chain of default providers with user options.
pub struct ConfigResolver {
    providers: Vec<Arc<dyn DefaultProvider>>,
}

impl ConfigResolver {
    /// Base defaults only.
    pub fn new() -> Self {
        Self {
            providers: vec![Arc::new(BaseDefaults)],
        }
    }

    /// Base defaults followed by the defaults of `framework`.
    pub fn with_framework(framework: Arc<dyn HostFramework>) -> Self {
        Self::new().push_provider(Arc::new(FrameworkDefaults::new(Some(framework))))
    }

    /// Append a provider; later providers take precedence over earlier ones.
    pub fn push_provider(mut self, provider: Arc<dyn DefaultProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    /// Layer every provider's defaults, ignoring providers that don't apply.
    pub fn defaults(&self, env: &ProcessEnv) -> ConfigOptions {
        self.providers
            .iter()
            .fold(ConfigOptions::default(), |acc, provider| match provider.defaults(env) {
                Some(layer) => acc.overlay(layer),
                None => {
                    tracing::debug!(provider = provider.name(), "Default provider skipped");
                    acc
                }
            })
    }

    /// Resolve `user` options into a validated config.
    pub fn resolve(&self, user: ConfigOptions, env: &ProcessEnv) -> Result<Config, ConfigError> {
        let defaults = self.defaults(env);
        let env_layer = options_from_env(env)?;

        // The file's location and section depend on every other layer.
        let locator = defaults.clone().overlay(env_layer.clone()).overlay(user.clone());
        let file_layer = match &locator.root {
            Some(root) => {
                let config_path = locator.config_path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
                let mode = locator.mode.as_deref().unwrap_or(DEFAULT_MODE);
                load_file_options(&root.join(config_path), mode)?
            }
            None => ConfigOptions::default(),
        };

        let merged = defaults.overlay(file_layer).overlay(env_layer).overlay(user);
        let config = Config::from_options(merged)?;
        validate_config(&config).map_err(ConfigError::Validation)?;

        tracing::info!(
            mode = %config.mode,
            root = %config.root.display(),
            dev_server = %config.host_with_port(),
            "Configuration resolved"
        );

        Ok(config)
    }

    /// Path of the config file `user` would resolve to, if a root is known.
    pub fn config_file(&self, user: &ConfigOptions, env: &ProcessEnv) -> Option<PathBuf> {
        let locator = self
            .defaults(env)
            .overlay(options_from_env(env).unwrap_or_default())
            .overlay(user.clone());
        let config_path = locator.config_path.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        locator.root.map(|root| root.join(config_path))
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}
