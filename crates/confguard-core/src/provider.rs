//! # Configuration Provider
//!
//! The validation pipeline never reaches for process-wide configuration
//! state. Instead it talks to a [`ConfigProvider`] handed to it by the
//! host, which it uses to:
//!
//! - register environment bindings for schema-declared paths,
//! - read every resolved key/value pair together with where it came from,
//! - report which configuration file is active, for diagnostics.
//!
//! [`LayeredConfig`] is the reference implementation. Precedence, lowest
//! first: defaults, configuration file, bound environment variables,
//! explicit overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::env::{EnvSource, ProcessEnv};
use crate::error::ConfigError;
use crate::file::load_config_file;
use crate::path::ConfigPath;
use crate::value_type::DeclaredType;

/// Where a resolved value came from. Ordered by precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueSource {
    /// Registered default.
    Default,
    /// Loaded from the configuration file.
    File,
    /// Read from a bound environment variable (always a raw string).
    Environment,
    /// Set explicitly by the host.
    Override,
}

/// A resolved configuration value and its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedValue {
    /// The value as stored by its layer.
    pub value: Value,
    /// The layer that supplied it.
    pub source: ValueSource,
}

/// A configuration path bound to an environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvBinding {
    /// Dotted path of the schema-declared property.
    pub path: ConfigPath,
    /// Name of the environment variable.
    pub env_var: String,
    /// JSON type declared by the schema for this property.
    pub declared_type: DeclaredType,
}

/// Contract between the validation pipeline and a configuration store.
pub trait ConfigProvider {
    /// Prefix applied to derived environment variable names, if any.
    fn env_prefix(&self) -> Option<&str>;

    /// Register a binding. Returns `false` and leaves the existing binding
    /// untouched when the path is already bound.
    fn bind_env(&mut self, binding: EnvBinding) -> bool;

    /// The binding registered for `path`, if any.
    fn binding(&self, path: &ConfigPath) -> Option<&EnvBinding>;

    /// All registered bindings, ordered by path.
    fn bindings(&self) -> Vec<&EnvBinding>;

    /// Every resolved leaf value, keyed by dotted path, after precedence
    /// has been applied.
    fn resolve_all(&self) -> BTreeMap<ConfigPath, ResolvedValue>;

    /// The configuration file currently in use.
    fn config_file_used(&self) -> Option<&Path>;
}

/// Reference layered configuration store.
pub struct LayeredConfig {
    defaults: BTreeMap<ConfigPath, Value>,
    file: BTreeMap<ConfigPath, Value>,
    overrides: BTreeMap<ConfigPath, Value>,
    bindings: BTreeMap<ConfigPath, EnvBinding>,
    env_prefix: Option<String>,
    env: Box<dyn EnvSource>,
    config_file: Option<PathBuf>,
}

impl std::fmt::Debug for LayeredConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredConfig")
            .field("defaults", &self.defaults.len())
            .field("file", &self.file.len())
            .field("overrides", &self.overrides.len())
            .field("bindings", &self.bindings.len())
            .field("env_prefix", &self.env_prefix)
            .field("config_file", &self.config_file)
            .finish()
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LayeredConfig {
    /// An empty store reading the process environment.
    pub fn new() -> Self {
        Self {
            defaults: BTreeMap::new(),
            file: BTreeMap::new(),
            overrides: BTreeMap::new(),
            bindings: BTreeMap::new(),
            env_prefix: None,
            env: Box::new(ProcessEnv),
            config_file: None,
        }
    }

    /// Replace the environment source.
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Set the prefix for derived environment variable names.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Register a default. Objects are flattened into their leaves.
    pub fn set_default(&mut self, path: impl Into<ConfigPath>, value: Value) {
        replace_subtree(&mut self.defaults, &path.into(), &value);
    }

    /// Set an explicit override. Objects are flattened into their leaves.
    pub fn set(&mut self, path: impl Into<ConfigPath>, value: Value) {
        replace_subtree(&mut self.overrides, &path.into(), &value);
    }

    /// Replace the file layer with the contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be loaded; the store is
    /// left unchanged in that case.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let value = load_config_file(path)?;
        let mut layer = BTreeMap::new();
        flatten_into(&ConfigPath::root(), &value, &mut layer);
        tracing::debug!(
            config_file = %path.display(),
            keys = layer.len(),
            "loaded configuration file"
        );
        self.file = layer;
        self.config_file = Some(path.to_path_buf());
        Ok(())
    }

    /// Resolved value of a single leaf.
    pub fn get(&self, path: &ConfigPath) -> Option<ResolvedValue> {
        self.resolve_all().remove(path)
    }

    fn env_value(&self, binding: &EnvBinding) -> Option<String> {
        // An empty variable counts as unset.
        self.env.var(&binding.env_var).filter(|v| !v.is_empty())
    }
}

impl ConfigProvider for LayeredConfig {
    fn env_prefix(&self) -> Option<&str> {
        self.env_prefix.as_deref()
    }

    fn bind_env(&mut self, binding: EnvBinding) -> bool {
        if self.bindings.contains_key(&binding.path) {
            return false;
        }
        tracing::trace!(path = %binding.path, env_var = %binding.env_var, "bound environment variable");
        self.bindings.insert(binding.path.clone(), binding);
        true
    }

    fn binding(&self, path: &ConfigPath) -> Option<&EnvBinding> {
        self.bindings.get(path)
    }

    fn bindings(&self) -> Vec<&EnvBinding> {
        self.bindings.values().collect()
    }

    fn resolve_all(&self) -> BTreeMap<ConfigPath, ResolvedValue> {
        let mut resolved = BTreeMap::new();
        for (path, value) in &self.defaults {
            shadow_insert(&mut resolved, path, value.clone(), ValueSource::Default);
        }
        for (path, value) in &self.file {
            shadow_insert(&mut resolved, path, value.clone(), ValueSource::File);
        }
        for binding in self.bindings.values() {
            if let Some(raw) = self.env_value(binding) {
                shadow_insert(
                    &mut resolved,
                    &binding.path,
                    Value::String(raw),
                    ValueSource::Environment,
                );
            }
        }
        for (path, value) in &self.overrides {
            shadow_insert(&mut resolved, path, value.clone(), ValueSource::Override);
        }
        resolved
    }

    fn config_file_used(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }
}

/// Flatten a value into dotted leaves. Non-empty objects are descended;
/// everything else, arrays included, is a leaf.
fn flatten_into(prefix: &ConfigPath, value: &Value, out: &mut BTreeMap<ConfigPath, Value>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(&prefix.join(key), child, out);
            }
        }
        _ if prefix.is_root() => {}
        leaf => {
            out.insert(prefix.clone(), leaf.clone());
        }
    }
}

fn replace_subtree(layer: &mut BTreeMap<ConfigPath, Value>, path: &ConfigPath, value: &Value) {
    layer.retain(|key, _| key != path && !path.is_ancestor_of(key) && !key.is_ancestor_of(path));
    flatten_into(path, value, layer);
}

/// Insert a higher-precedence leaf, dropping any lower-precedence entry
/// that would collide with it when the snapshot is nested.
fn shadow_insert(
    resolved: &mut BTreeMap<ConfigPath, ResolvedValue>,
    path: &ConfigPath,
    value: Value,
    source: ValueSource,
) {
    resolved.retain(|key, _| !path.is_ancestor_of(key) && !key.is_ancestor_of(path));
    resolved.insert(path.clone(), ResolvedValue { value, source });
}
