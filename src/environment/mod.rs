//! Process environment snapshots.
//!
//! # Responsibilities
//! - Capture the process environment once per instance
//! - Select the `VITE_RUBY*` subset that is propagated to the bundler
//! - Expose the CI signal used by the proxy decision
//!
//! # Design Decisions
//! - Snapshots are immutable; edits to the live environment after capture
//!   are only seen by instances created later (e.g. after a reload)
//! - Non-unicode variables are skipped rather than panicking

use std::collections::BTreeMap;

use serde::Serialize;

/// Prefix selecting the variables that configure the bridge and the bundler.
pub const ENV_PREFIX: &str = "VITE_RUBY";

/// Variable whose presence marks a continuous-integration run.
pub const CI_VAR: &str = "CI";

/// A full copy of the process environment taken at a single point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessEnv {
    vars: BTreeMap<String, String>,
}

impl ProcessEnv {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// True when the CI variable is set, whatever its value.
    pub fn is_ci(&self) -> bool {
        self.vars.contains_key(CI_VAR)
    }

    /// Entries whose key starts with `prefix`.
    pub fn with_prefix(&self, prefix: &str) -> EnvSnapshot {
        EnvSnapshot {
            vars: self
                .vars
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProcessEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// The prefixed subset of a [`ProcessEnv`], passed through to spawned processes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.vars.clone()
    }
}
