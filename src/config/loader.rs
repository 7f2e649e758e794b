//! Configuration layers read from disk and from the environment.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ConfigOptions;
use crate::config::validation::ValidationError;
use crate::environment::{ProcessEnv, ENV_PREFIX};

/// Section of the config file applied to every mode.
pub const SHARED_SECTION: &str = "all";

/// Error type for configuration resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value {value:?} for {key}")]
    InvalidEnv { key: String, value: String },

    #[error("Unable to determine the application root")]
    MissingRoot,

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load the layer for `mode` from a JSON or TOML config file.
///
/// The file holds named sections; `"all"` is applied first and the section
/// named after the mode on top of it. A missing file is an empty layer.
///
/// `mode`, `root` and `config_path` locate the file and its section, so the
/// file cannot set them; such entries are dropped.
pub fn load_file_options(path: &Path, mode: &str) -> Result<ConfigOptions, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, skipping file layer");
        return Ok(ConfigOptions::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut sections = parse_sections(path, &content)?;
    let shared = sections.remove(SHARED_SECTION).unwrap_or_default();
    let for_mode = sections.remove(mode).unwrap_or_default();

    let mut options = shared.overlay(for_mode);
    for (field, present) in [
        ("mode", options.mode.take().is_some()),
        ("root", options.root.take().is_some()),
        ("config_path", options.config_path.take().is_some()),
    ] {
        if present {
            tracing::warn!(path = %path.display(), field, "Ignoring locating field in config file");
        }
    }

    Ok(options)
}

fn parse_sections(path: &Path, content: &str) -> Result<BTreeMap<String, ConfigOptions>, ConfigError> {
    let is_toml = path.extension().is_some_and(|ext| ext == "toml");
    let parsed = if is_toml {
        toml::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(content).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Build a layer from `VITE_RUBY_<FIELD>` variables.
///
/// Malformed values are configuration errors rather than silently ignored.
pub fn options_from_env(env: &ProcessEnv) -> Result<ConfigOptions, ConfigError> {
    let var = |field: &str| env.get(&format!("{}_{}", ENV_PREFIX, field)).map(str::to_string);

    Ok(ConfigOptions {
        mode: var("MODE"),
        root: var("ROOT").map(PathBuf::from),
        config_path: var("CONFIG_PATH"),
        host: var("HOST"),
        port: parse_var(env, "PORT")?,
        https: parse_var(env, "HTTPS")?,
        public_dir: var("PUBLIC_DIR"),
        public_output_dir: var("PUBLIC_OUTPUT_DIR"),
        source_code_dir: var("SOURCE_CODE_DIR"),
        build_cache_dir: var("BUILD_CACHE_DIR"),
        watch_additional_paths: var("WATCH_ADDITIONAL_PATHS").map(|paths| {
            paths
                .split(',')
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(str::to_string)
                .collect()
        }),
        dev_server_connect_timeout: parse_var(env, "DEV_SERVER_CONNECT_TIMEOUT")?,
        asset_host: var("ASSET_HOST"),
        executable: var("EXECUTABLE"),
        tag_options: BTreeMap::new(),
    })
}

fn parse_var<T: std::str::FromStr>(env: &ProcessEnv, field: &str) -> Result<Option<T>, ConfigError> {
    let key = format!("{}_{}", ENV_PREFIX, field);
    match env.get(&key) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|_| ConfigError::InvalidEnv {
            key,
            value: value.to_string(),
        }),
    }
}
