//! The current instance and its atomic replacement.
//!
//! # Responsibilities
//! - Create the instance lazily on first access
//! - Publish a new instance on reload without readers ever seeing a mix
//! - Forward the common operations to whatever instance is current
//!
//! # Design Decisions
//! - Readers take an `Arc<Instance>` snapshot; a reload swaps the pointer
//!   and the old instance is dropped once its last reader is done
//! - Reload never touches the old instance's caches

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use once_cell::sync::OnceCell;

use crate::config::{Config, ConfigError, ConfigOptions, ConfigResolver, HostFramework};
use crate::dev_server::PROBE_WINDOW;
use crate::environment::{EnvSnapshot, ProcessEnv};
use crate::error::BridgeResult;
use crate::observability::metrics;
use crate::runtime::instance::Instance;
use crate::subsystems::{Commands, ManifestLoader, NoManifest, RunOptions, RunOutput};

static GLOBAL: OnceCell<Registry> = OnceCell::new();

type EnvSource = Arc<dyn Fn() -> ProcessEnv + Send + Sync>;

/// Holds the current [`Instance`].
pub struct Registry {
    resolver: Arc<ConfigResolver>,
    manifest_loader: Arc<dyn ManifestLoader>,
    env_source: EnvSource,
    probe_window: Duration,
    current: ArcSwapOption<Instance>,
}

impl Registry {
    /// Registry with base defaults only, reading the real process environment.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The process-wide registry, created with [`Registry::new`] on first use
    /// unless one was installed before.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    /// Make `self` the process-wide registry. Fails if one already exists.
    pub fn install_global(self) -> Result<&'static Registry, Registry> {
        GLOBAL.set(self)?;
        Ok(Self::global())
    }

    /// The current instance, created with default options if there is none.
    pub fn instance(&self) -> Arc<Instance> {
        if let Some(current) = self.current.load_full() {
            return current;
        }

        let candidate = Arc::new(self.build_instance(ConfigOptions::default()));
        let empty: Option<Arc<Instance>> = None;
        let previous = self.current.compare_and_swap(&empty, Some(candidate.clone()));
        match &*previous {
            // Another thread published first; ours is discarded unused.
            Some(winner) => winner.clone(),
            None => candidate,
        }
    }

    /// Replace the current instance with a fresh one built from `options`.
    pub fn reload(&self, options: ConfigOptions) -> Arc<Instance> {
        let instance = Arc::new(self.build_instance(options));
        self.current.store(Some(instance.clone()));
        metrics::record_reload();
        tracing::info!("Instance reloaded");
        instance
    }

    fn build_instance(&self, options: ConfigOptions) -> Instance {
        Instance::new(
            options,
            self.resolver.clone(),
            self.manifest_loader.clone(),
            (self.env_source)(),
            self.probe_window,
        )
    }

    pub fn config(&self) -> Result<Arc<Config>, ConfigError> {
        self.instance().config()
    }

    pub fn commands(&self) -> Result<Arc<Commands>, ConfigError> {
        self.instance().commands()
    }

    pub fn digest(&self) -> BridgeResult<String> {
        self.instance().digest()
    }

    pub fn env(&self) -> Arc<EnvSnapshot> {
        self.instance().env()
    }

    pub async fn run(&self, argv: &[String], options: RunOptions) -> BridgeResult<RunOutput> {
        self.instance().run(argv, options).await
    }

    pub fn run_proxy(&self) -> bool {
        self.instance().run_proxy()
    }

    pub async fn dev_server_running(&self) -> bool {
        self.instance().dev_server_running().await
    }

    /// Refresh the current instance's manifest. Returns the entry count.
    pub fn bootstrap(&self) -> BridgeResult<usize> {
        Ok(self.instance().manifest()?.refresh()?)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Configures the collaborators shared by every instance of a [`Registry`].
pub struct RegistryBuilder {
    resolver: ConfigResolver,
    manifest_loader: Arc<dyn ManifestLoader>,
    env_source: EnvSource,
    probe_window: Duration,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            resolver: ConfigResolver::new(),
            manifest_loader: Arc::new(NoManifest),
            env_source: Arc::new(ProcessEnv::capture),
            probe_window: PROBE_WINDOW,
        }
    }
}

impl RegistryBuilder {
    pub fn framework(mut self, framework: Arc<dyn HostFramework>) -> Self {
        self.resolver = ConfigResolver::with_framework(framework);
        self
    }

    pub fn resolver(mut self, resolver: ConfigResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn manifest_loader(mut self, loader: Arc<dyn ManifestLoader>) -> Self {
        self.manifest_loader = loader;
        self
    }

    /// Use a fixed environment instead of capturing the process environment.
    pub fn env(mut self, env: ProcessEnv) -> Self {
        self.env_source = Arc::new(move || env.clone());
        self
    }

    pub fn probe_window(mut self, window: Duration) -> Self {
        self.probe_window = window;
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            resolver: Arc::new(self.resolver),
            manifest_loader: self.manifest_loader,
            env_source: self.env_source,
            probe_window: self.probe_window,
            current: ArcSwapOption::empty(),
        }
    }
}
