//! # Environment Sources
//!
//! Abstracts environment-variable lookup behind a trait so that hosts can
//! read the process environment while tests inject a fixed map.

use std::collections::BTreeMap;

use crate::path::{ConfigPath, PATH_SEPARATOR};

/// Read access to environment variables.
pub trait EnvSource: Send + Sync {
    /// Value of `name`, if set.
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    vars: BTreeMap<String, String>,
}

impl MapEnv {
    /// An empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a variable, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Derive the environment variable bound to a configuration path.
///
/// The path is uppercased and `.` becomes `_`. A non-empty prefix is
/// uppercased and joined with `_`:
///
/// ```
/// use confguard_core::{env_var_name, ConfigPath};
///
/// let path = ConfigPath::new("service.port");
/// assert_eq!(env_var_name(None, &path), "SERVICE_PORT");
/// assert_eq!(env_var_name(Some("app"), &path), "APP_SERVICE_PORT");
/// ```
pub fn env_var_name(prefix: Option<&str>, path: &ConfigPath) -> String {
    let key = path.as_str().replace(PATH_SEPARATOR, "_").to_uppercase();
    match prefix.map(|p| p.trim().trim_end_matches('_')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}_{key}", prefix.to_uppercase()),
        None => key,
    }
}
