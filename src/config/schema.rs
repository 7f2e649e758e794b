//! Configuration schema definitions.
//!
//! `ConfigOptions` is the partial, layerable form: every field is optional
//! and layers are combined with [`ConfigOptions::overlay`]. `Config` is the
//! resolved record handed to every subsystem behind an `Arc`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};
use url::Url;

use crate::config::loader::ConfigError;
use crate::config::validation::ValidationError;
use crate::environment::ENV_PREFIX;

pub const DEFAULT_MODE: &str = "development";
pub const DEFAULT_CONFIG_PATH: &str = "config/vite.json";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3036;
pub const DEFAULT_HTTPS: bool = true;
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_PUBLIC_OUTPUT_DIR: &str = "vite";
pub const DEFAULT_SOURCE_CODE_DIR: &str = "app/frontend";
pub const DEFAULT_BUILD_CACHE_DIR: &str = "tmp/cache/vite";
pub const DEFAULT_EXECUTABLE: &str = "node_modules/.bin/vite";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: f64 = 0.01;

/// Tag-option maps every resolved config carries, empty unless configured.
pub const TAG_OPTION_NAMES: &[&str] = &[
    "javascript_tag_options",
    "stylesheet_tag_options",
    "image_tag_options",
    "vite_client_tag_options",
];

/// Extra HTML attributes for one kind of tag helper.
pub type TagOptions = BTreeMap<String, serde_json::Value>;

static EMPTY_TAG_OPTIONS: TagOptions = BTreeMap::new();

/// One layer of configuration. Unset fields fall through to lower layers.
///
/// Config files may spell keys in snake_case or camelCase.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigOptions {
    pub mode: Option<String>,
    pub root: Option<PathBuf>,
    #[serde(alias = "configPath")]
    pub config_path: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub https: Option<bool>,
    #[serde(alias = "publicDir")]
    pub public_dir: Option<String>,
    #[serde(alias = "publicOutputDir")]
    pub public_output_dir: Option<String>,
    #[serde(alias = "sourceCodeDir")]
    pub source_code_dir: Option<String>,
    #[serde(alias = "buildCacheDir")]
    pub build_cache_dir: Option<String>,
    #[serde(alias = "watchAdditionalPaths")]
    pub watch_additional_paths: Option<Vec<String>>,
    /// Seconds, fractional.
    #[serde(alias = "devServerConnectTimeout")]
    pub dev_server_connect_timeout: Option<f64>,
    #[serde(alias = "assetHost")]
    pub asset_host: Option<String>,
    pub executable: Option<String>,
    /// Per-name maps; a name set in a higher layer replaces the whole map.
    #[serde(alias = "tagOptions")]
    pub tag_options: BTreeMap<String, TagOptions>,
}

impl ConfigOptions {
    /// Combine two layers, `higher` winning field by field.
    pub fn overlay(self, higher: ConfigOptions) -> ConfigOptions {
        let mut tag_options = self.tag_options;
        tag_options.extend(higher.tag_options);

        ConfigOptions {
            mode: higher.mode.or(self.mode),
            root: higher.root.or(self.root),
            config_path: higher.config_path.or(self.config_path),
            host: higher.host.or(self.host),
            port: higher.port.or(self.port),
            https: higher.https.or(self.https),
            public_dir: higher.public_dir.or(self.public_dir),
            public_output_dir: higher.public_output_dir.or(self.public_output_dir),
            source_code_dir: higher.source_code_dir.or(self.source_code_dir),
            build_cache_dir: higher.build_cache_dir.or(self.build_cache_dir),
            watch_additional_paths: higher.watch_additional_paths.or(self.watch_additional_paths),
            dev_server_connect_timeout: higher
                .dev_server_connect_timeout
                .or(self.dev_server_connect_timeout),
            asset_host: higher.asset_host.or(self.asset_host),
            executable: higher.executable.or(self.executable),
            tag_options,
        }
    }
}

/// Resolved configuration for one instance. Never mutated after resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// Environment name, e.g. "development", "test" or "production".
    pub mode: String,

    /// Application root; relative paths below are resolved against it.
    pub root: PathBuf,

    /// Location of the JSON/TOML config file, relative to `root`.
    pub config_path: String,

    /// Dev server host.
    pub host: String,

    /// Dev server port.
    pub port: u16,

    /// Whether the dev server speaks HTTPS.
    pub https: bool,

    pub public_dir: String,

    /// Directory under `public_dir` (and URL prefix) for built assets.
    pub public_output_dir: String,

    pub source_code_dir: String,

    pub build_cache_dir: String,

    /// Extra files or directories that invalidate a build when changed.
    pub watch_additional_paths: Vec<String>,

    /// Upper bound on establishing a connection to the dev server.
    #[serde(serialize_with = "serialize_secs")]
    pub dev_server_connect_timeout: Duration,

    /// Static asset host. Dynamic hosts are never stored here.
    pub asset_host: Option<String>,

    /// Bundler executable, relative to `root` unless it is a bare command name.
    pub executable: String,

    pub tag_options: BTreeMap<String, TagOptions>,
}

impl Config {
    /// Build a config from a fully merged layer.
    ///
    /// Only `root` is structurally required; every other field has a fallback.
    pub fn from_options(options: ConfigOptions) -> Result<Config, ConfigError> {
        let root = options.root.ok_or(ConfigError::MissingRoot)?;

        let timeout_secs = options
            .dev_server_connect_timeout
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        let dev_server_connect_timeout = Duration::try_from_secs_f64(timeout_secs)
            .map_err(|_| ConfigError::Validation(vec![ValidationError::InvalidTimeout(timeout_secs)]))?;

        let mut tag_options = options.tag_options;
        for name in TAG_OPTION_NAMES {
            tag_options.entry((*name).to_string()).or_default();
        }

        Ok(Config {
            mode: options.mode.unwrap_or_else(|| DEFAULT_MODE.to_string()),
            root,
            config_path: options.config_path.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
            host: options.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: options.port.unwrap_or(DEFAULT_PORT),
            https: options.https.unwrap_or(DEFAULT_HTTPS),
            public_dir: options.public_dir.unwrap_or_else(|| DEFAULT_PUBLIC_DIR.to_string()),
            public_output_dir: options
                .public_output_dir
                .unwrap_or_else(|| DEFAULT_PUBLIC_OUTPUT_DIR.to_string()),
            source_code_dir: options
                .source_code_dir
                .unwrap_or_else(|| DEFAULT_SOURCE_CODE_DIR.to_string()),
            build_cache_dir: options
                .build_cache_dir
                .unwrap_or_else(|| DEFAULT_BUILD_CACHE_DIR.to_string()),
            watch_additional_paths: options.watch_additional_paths.unwrap_or_default(),
            dev_server_connect_timeout,
            asset_host: options.asset_host,
            executable: options.executable.unwrap_or_else(|| DEFAULT_EXECUTABLE.to_string()),
            tag_options,
        })
    }

    pub fn protocol(&self) -> &'static str {
        if self.https {
            "https"
        } else {
            "http"
        }
    }

    pub fn host_with_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL probed to decide whether the dev server is up.
    pub fn dev_server_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}://{}/{}",
            self.protocol(),
            self.host_with_port(),
            self.public_output_dir
        ))
    }

    /// Tag options for `name`, empty when nothing was configured.
    pub fn tag_options(&self, name: &str) -> &TagOptions {
        self.tag_options.get(name).unwrap_or(&EMPTY_TAG_OPTIONS)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(&self.config_path)
    }

    pub fn public_output_path(&self) -> PathBuf {
        self.root.join(&self.public_dir).join(&self.public_output_dir)
    }

    pub fn build_cache_path(&self) -> PathBuf {
        self.root.join(&self.build_cache_dir)
    }

    /// The resolved config as `VITE_RUBY_*` variables for a child process.
    pub fn to_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        let mut set = |key: &str, value: String| {
            env.insert(format!("{}_{}", ENV_PREFIX, key), value);
        };

        set("MODE", self.mode.clone());
        set("ROOT", self.root.display().to_string());
        set("CONFIG_PATH", self.config_path.clone());
        set("HOST", self.host.clone());
        set("PORT", self.port.to_string());
        set("HTTPS", self.https.to_string());
        set("PUBLIC_DIR", self.public_dir.clone());
        set("PUBLIC_OUTPUT_DIR", self.public_output_dir.clone());
        set("SOURCE_CODE_DIR", self.source_code_dir.clone());
        set("BUILD_CACHE_DIR", self.build_cache_dir.clone());
        set(
            "DEV_SERVER_CONNECT_TIMEOUT",
            self.dev_server_connect_timeout.as_secs_f64().to_string(),
        );
        if let Some(asset_host) = &self.asset_host {
            set("ASSET_HOST", asset_host.clone());
        }

        env
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
