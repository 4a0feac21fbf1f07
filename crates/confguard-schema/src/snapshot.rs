//! # Configuration Snapshotter
//!
//! Captures the provider's fully resolved view as an ordered map of
//! dotted keys to JSON values, and renders it as the nested JSON object
//! the validator consumes.
//!
//! Values that came from the environment are raw strings. They are
//! coerced to the declared type of their binding here, before
//! serialization; a value that does not coerce stays a string so the
//! validator reports it.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use confguard_core::{ConfigPath, ConfigProvider, EnvBinding, ValueSource};

/// The effective configuration at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationSnapshot {
    entries: BTreeMap<ConfigPath, Value>,
}

impl ConfigurationSnapshot {
    /// Leaf values keyed by dotted path.
    pub fn entries(&self) -> &BTreeMap<ConfigPath, Value> {
        &self.entries
    }

    /// Value of one leaf.
    pub fn get(&self, path: &ConfigPath) -> Option<&Value> {
        self.entries.get(path)
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the provider resolved nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The snapshot as a nested JSON object whose structure mirrors the
    /// dotted paths.
    pub fn to_json_value(&self) -> Value {
        let mut root = Map::new();
        for (path, value) in &self.entries {
            insert_nested(&mut root, path, value.clone());
        }
        Value::Object(root)
    }

    /// The serialized form of [`to_json_value`](Self::to_json_value).
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.to_json_value())
    }
}

/// Read the provider's current state. Pure: nothing is registered or
/// cached.
pub fn snapshot<P>(provider: &P) -> ConfigurationSnapshot
where
    P: ConfigProvider + ?Sized,
{
    let mut entries = BTreeMap::new();
    for (path, resolved) in provider.resolve_all() {
        let value = match (resolved.source, provider.binding(&path)) {
            (ValueSource::Environment, Some(binding)) => coerce_env_value(binding, resolved.value),
            _ => resolved.value,
        };
        entries.insert(path, value);
    }
    tracing::debug!(keys = entries.len(), "captured configuration snapshot");
    ConfigurationSnapshot { entries }
}

fn coerce_env_value(binding: &EnvBinding, value: Value) -> Value {
    let raw = match value {
        Value::String(raw) => raw,
        other => return other,
    };
    match binding.declared_type.coerce(&raw) {
        Some(coerced) => coerced,
        None => {
            tracing::debug!(
                path = %binding.path,
                env_var = %binding.env_var,
                declared_type = %binding.declared_type,
                "environment value does not coerce to declared type"
            );
            Value::String(raw)
        }
    }
}

fn insert_nested(root: &mut Map<String, Value>, path: &ConfigPath, value: Value) {
    let segments: Vec<&str> = path.segments().collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut node = root;
    for segment in parents {
        let slot = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(child) = slot else {
            return;
        };
        node = child;
    }
    node.insert(last.to_string(), value);
}
