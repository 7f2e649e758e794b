//! One configuration and everything built from it.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::config::{Config, ConfigError, ConfigOptions, ConfigResolver};
use crate::dev_server::{should_proxy, LivenessProbe, ProbeState};
use crate::environment::{EnvSnapshot, ProcessEnv, ENV_PREFIX};
use crate::error::BridgeResult;
use crate::subsystems::{Builder, Commands, Manifest, ManifestLoader, RunOptions, RunOutput, Runner};

/// A resolved-on-demand configuration plus its lazily built subsystems.
///
/// Every cell is initialized at most once; racing first accesses block on
/// the cell and observe the same value. Nothing here is ever reset: a
/// reload builds a new `Instance` instead.
pub struct Instance {
    options: ConfigOptions,
    resolver: Arc<ConfigResolver>,
    manifest_loader: Arc<dyn ManifestLoader>,
    process_env: ProcessEnv,
    probe_window: Duration,

    config: OnceCell<Arc<Config>>,
    env: OnceCell<Arc<EnvSnapshot>>,
    probe: OnceCell<LivenessProbe>,
    builder: OnceCell<Arc<Builder>>,
    manifest: OnceCell<Arc<Manifest>>,
    runner: OnceCell<Arc<Runner>>,
    commands: OnceCell<Arc<Commands>>,
}

impl Instance {
    pub fn new(
        options: ConfigOptions,
        resolver: Arc<ConfigResolver>,
        manifest_loader: Arc<dyn ManifestLoader>,
        process_env: ProcessEnv,
        probe_window: Duration,
    ) -> Self {
        Self {
            options,
            resolver,
            manifest_loader,
            process_env,
            probe_window,
            config: OnceCell::new(),
            env: OnceCell::new(),
            probe: OnceCell::new(),
            builder: OnceCell::new(),
            manifest: OnceCell::new(),
            runner: OnceCell::new(),
            commands: OnceCell::new(),
        }
    }

    /// The user options this instance was created with.
    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    /// Resolved configuration. Resolved on first call; a failure is returned
    /// to the caller and resolution is attempted again on the next call.
    pub fn config(&self) -> Result<Arc<Config>, ConfigError> {
        self.config
            .get_or_try_init(|| {
                self.resolver
                    .resolve(self.options.clone(), &self.process_env)
                    .map(Arc::new)
            })
            .cloned()
    }

    /// `VITE_RUBY*` variables from the environment captured with this instance.
    pub fn env(&self) -> Arc<EnvSnapshot> {
        self.env
            .get_or_init(|| Arc::new(self.process_env.with_prefix(ENV_PREFIX)))
            .clone()
    }

    /// Whether asset requests should be proxied to the dev server. Never fails.
    pub fn run_proxy(&self) -> bool {
        match self.config() {
            Ok(config) => should_proxy(&config.mode, self.process_env.is_ci()),
            Err(e) => {
                tracing::error!(error = %e, "Failed to check mode for Vite");
                false
            }
        }
    }

    /// Whether the dev server is reachable, checked at most once per window.
    pub async fn dev_server_running(&self) -> bool {
        if !self.run_proxy() {
            return false;
        }
        match self.probe() {
            Ok(probe) => probe.is_up().await,
            Err(_) => false,
        }
    }

    /// Last observed dev server state, without probing.
    pub async fn dev_server_state(&self) -> ProbeState {
        match self.probe.get() {
            Some(probe) => probe.state().await,
            None => ProbeState::Unknown,
        }
    }

    pub fn probe(&self) -> Result<&LivenessProbe, ConfigError> {
        let config = self.config()?;
        Ok(self
            .probe
            .get_or_init(|| LivenessProbe::new(&config).with_window(self.probe_window)))
    }

    pub fn builder(&self) -> Result<Arc<Builder>, ConfigError> {
        let config = self.config()?;
        Ok(self
            .builder
            .get_or_init(|| Arc::new(Builder::new(config)))
            .clone())
    }

    pub fn manifest(&self) -> Result<Arc<Manifest>, ConfigError> {
        let config = self.config()?;
        Ok(self
            .manifest
            .get_or_init(|| Arc::new(Manifest::new(config, self.manifest_loader.clone())))
            .clone())
    }

    pub fn runner(&self) -> Result<Arc<Runner>, ConfigError> {
        let config = self.config()?;
        Ok(self
            .runner
            .get_or_init(|| Arc::new(Runner::new(config, self.env())))
            .clone())
    }

    pub fn commands(&self) -> Result<Arc<Commands>, ConfigError> {
        let config = self.config()?;
        let builder = self.builder()?;
        let runner = self.runner()?;
        Ok(self
            .commands
            .get_or_init(|| Arc::new(Commands::new(config, builder, runner)))
            .clone())
    }

    /// Digest of the watched source files.
    pub fn digest(&self) -> BridgeResult<String> {
        Ok(self.builder()?.watched_files_digest()?)
    }

    /// Execute the bundler.
    pub async fn run(&self, argv: &[String], options: RunOptions) -> BridgeResult<RunOutput> {
        Ok(self.runner()?.run(argv, options).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::NoManifest;
    use std::path::Path;

    fn instance(options: ConfigOptions, env: ProcessEnv) -> Instance {
        Instance::new(
            options,
            Arc::new(ConfigResolver::new()),
            Arc::new(NoManifest),
            env,
            Duration::from_secs(1),
        )
    }

    fn rooted(root: &Path, mode: &str) -> ConfigOptions {
        ConfigOptions {
            root: Some(root.to_path_buf()),
            mode: Some(mode.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_resolves_once() {
        let dir = tempfile::tempdir().unwrap();
        let instance = instance(rooted(dir.path(), "production"), ProcessEnv::default());

        let first = instance.config().unwrap();
        let second = instance.config().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.mode, "production");
    }

    #[test]
    fn test_handles_are_cached() {
        let dir = tempfile::tempdir().unwrap();
        let instance = instance(rooted(dir.path(), "development"), ProcessEnv::default());

        assert!(Arc::ptr_eq(&instance.builder().unwrap(), &instance.builder().unwrap()));
        assert!(Arc::ptr_eq(&instance.manifest().unwrap(), &instance.manifest().unwrap()));
        assert!(Arc::ptr_eq(&instance.runner().unwrap(), &instance.runner().unwrap()));
        assert!(Arc::ptr_eq(&instance.commands().unwrap(), &instance.commands().unwrap()));
        assert!(Arc::ptr_eq(&instance.env(), &instance.env()));
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        let dir = tempfile::tempdir().unwrap();
        let instance = Arc::new(instance(rooted(dir.path(), "development"), ProcessEnv::default()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let instance = instance.clone();
                std::thread::spawn(move || instance.builder().unwrap())
            })
            .collect();
        let builders: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(builders.iter().all(|b| Arc::ptr_eq(b, &builders[0])));
    }

    #[test]
    fn test_env_is_prefixed_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let env: ProcessEnv = [("VITE_RUBY_HOST", "vite.local"), ("DATABASE_URL", "postgres://")]
            .into_iter()
            .collect();
        let instance = instance(rooted(dir.path(), "development"), env);

        let snapshot = instance.env();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("VITE_RUBY_HOST"), Some("vite.local"));
    }

    #[test]
    fn test_run_proxy() {
        let dir = tempfile::tempdir().unwrap();
        let ci: ProcessEnv = [("CI", "true")].into_iter().collect();

        assert!(instance(rooted(dir.path(), "development"), ci.clone()).run_proxy());
        assert!(instance(rooted(dir.path(), "test"), ProcessEnv::default()).run_proxy());
        assert!(!instance(rooted(dir.path(), "test"), ci).run_proxy());
        assert!(!instance(rooted(dir.path(), "production"), ProcessEnv::default()).run_proxy());
    }

    #[test]
    fn test_run_proxy_degrades_on_config_failure() {
        let dir = tempfile::tempdir().unwrap();
        let options = ConfigOptions {
            port: Some(0),
            ..rooted(dir.path(), "development")
        };
        let instance = instance(options, ProcessEnv::default());

        assert!(instance.config().is_err());
        assert!(!instance.run_proxy());
        assert!(instance.builder().is_err());
    }

    #[tokio::test]
    async fn test_dev_server_short_circuits_without_proxy() {
        let dir = tempfile::tempdir().unwrap();
        let instance = instance(rooted(dir.path(), "production"), ProcessEnv::default());

        assert!(!instance.dev_server_running().await);
        assert_eq!(instance.dev_server_state().await, ProbeState::Unknown);
        assert_eq!(instance.probe().unwrap().probes_sent(), 0);
    }

    #[test]
    fn test_digest_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let instance = instance(rooted(dir.path(), "development"), ProcessEnv::default());

        assert_eq!(
            instance.digest().unwrap(),
            instance.builder().unwrap().watched_files_digest().unwrap()
        );
    }
}
