//! # Environment Binder
//!
//! Walks the properties a schema declares and registers every leaf path
//! with the configuration provider as overridable by an environment
//! variable. The binding carries the declared JSON type so the
//! snapshotter can coerce the raw string later.
//!
//! ## Walk rules
//!
//! - Objects with `properties` are descended; their own path is not bound.
//! - Arrays are leaves. `items` only refines the element type; indices
//!   are never enumerated.
//! - Local `$ref`s (`#/definitions/..`, `#/$defs/..`) are followed. A
//!   reference that re-enters itself stops the descent at that path.
//! - Remote `$ref`s are bound as untyped leaves.
//! - A property name containing `.` is rejected: its dotted key would
//!   collide with a nested path.
//!
//! The whole schema is walked before anything is registered, so a
//! malformed schema leaves the provider untouched.

use serde_json::{Map, Value};

use confguard_core::path::PATH_SEPARATOR;
use confguard_core::{env_var_name, json_type_name, ConfigPath, ConfigProvider, DeclaredType, EnvBinding};

use crate::error::SchemaWalkError;

/// A leaf property declared by a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPath {
    /// Dotted configuration path.
    pub path: ConfigPath,
    /// Declared JSON type.
    pub declared_type: DeclaredType,
}

/// Enumerate every leaf property path declared by `content`, in schema
/// declaration order.
///
/// # Errors
///
/// Returns [`SchemaWalkError`] if the content is not JSON, the root is not
/// an object, a `properties` keyword is not an object or names a property
/// containing `.`, or a local `$ref` does not resolve.
pub fn list_schema_paths(content: &[u8]) -> Result<Vec<SchemaPath>, SchemaWalkError> {
    let root: Value = serde_json::from_slice(content)?;
    if !root.is_object() {
        return Err(SchemaWalkError::RootNotObject {
            found: json_type_name(&root),
        });
    }

    let mut walker = Walker {
        root: &root,
        active_refs: Vec::new(),
        paths: Vec::new(),
    };
    walker.walk(&ConfigPath::root(), &root)?;
    Ok(walker.paths)
}

/// Register an environment binding for every leaf path declared by
/// `content`. Already-bound paths are left as they are.
///
/// Returns the number of bindings that were newly registered.
///
/// # Errors
///
/// Returns [`SchemaWalkError`] for a malformed schema, in which case no
/// binding has been registered.
pub fn bind_environment<P>(provider: &mut P, content: &[u8]) -> Result<usize, SchemaWalkError>
where
    P: ConfigProvider + ?Sized,
{
    let paths = list_schema_paths(content)?;
    let prefix = provider.env_prefix().map(str::to_owned);
    let total = paths.len();

    let mut registered = 0;
    for SchemaPath {
        path,
        declared_type,
    } in paths
    {
        let env_var = env_var_name(prefix.as_deref(), &path);
        if provider.bind_env(EnvBinding {
            path,
            env_var,
            declared_type,
        }) {
            registered += 1;
        }
    }

    tracing::debug!(total, registered, "bound schema properties to environment");
    Ok(registered)
}

struct Walker<'a> {
    root: &'a Value,
    active_refs: Vec<&'a str>,
    paths: Vec<SchemaPath>,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, path: &ConfigPath, schema: &'a Value) -> Result<(), SchemaWalkError> {
        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            return self.walk_ref(path, reference);
        }

        let properties = match schema.get("properties") {
            None => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => {
                return Err(SchemaWalkError::PropertiesNotObject {
                    path: path.to_string(),
                })
            }
        };

        let declared_type = self.declared_type(schema);
        match properties {
            Some(map) if descends(map, &declared_type) => {
                for (name, child) in map {
                    if name.contains(PATH_SEPARATOR) {
                        return Err(SchemaWalkError::DottedPropertyName {
                            parent: path.to_string(),
                            name: name.clone(),
                        });
                    }
                    self.walk(&path.join(name), child)?;
                }
            }
            _ if path.is_root() => {}
            _ => self.leaf(path, declared_type),
        }
        Ok(())
    }

    fn walk_ref(&mut self, path: &ConfigPath, reference: &'a str) -> Result<(), SchemaWalkError> {
        let Some(fragment) = reference.strip_prefix('#') else {
            if !path.is_root() {
                self.leaf(path, DeclaredType::Any);
            }
            return Ok(());
        };

        if self.active_refs.contains(&reference) {
            tracing::debug!(path = %path, reference, "recursive schema reference, not descending");
            if !path.is_root() {
                self.leaf(path, DeclaredType::Object);
            }
            return Ok(());
        }

        let target = self.resolve_local(fragment, reference)?;
        self.active_refs.push(reference);
        let result = self.walk(path, target);
        self.active_refs.pop();
        result
    }

    fn resolve_local(&self, fragment: &str, reference: &str) -> Result<&'a Value, SchemaWalkError> {
        self.root
            .pointer(fragment)
            .ok_or_else(|| SchemaWalkError::DanglingReference {
                reference: reference.to_string(),
            })
    }

    fn leaf(&mut self, path: &ConfigPath, declared_type: DeclaredType) {
        self.paths.push(SchemaPath {
            path: path.clone(),
            declared_type,
        });
    }

    /// `type` wins; otherwise the type of `default` or `const`; otherwise
    /// the shape implied by `properties` or `items`.
    fn declared_type(&self, schema: &'a Value) -> DeclaredType {
        let declared = keyword_type(schema).unwrap_or_else(|| {
            if schema.get("properties").is_some() {
                DeclaredType::Object
            } else if schema.get("items").is_some() {
                DeclaredType::Array(Box::new(DeclaredType::Any))
            } else {
                DeclaredType::Any
            }
        });

        match (declared, schema.get("items")) {
            (DeclaredType::Array(_), Some(items)) => {
                DeclaredType::Array(Box::new(self.item_type(items)))
            }
            (declared, _) => declared,
        }
    }

    /// Element type of an array. Follows at most one local `$ref` and does
    /// not look into nested arrays' items.
    fn item_type(&self, items: &'a Value) -> DeclaredType {
        let items = match items.get("$ref").and_then(Value::as_str) {
            Some(reference) => match reference.strip_prefix('#') {
                Some(fragment) => match self.root.pointer(fragment) {
                    Some(target) => target,
                    None => return DeclaredType::Any,
                },
                None => return DeclaredType::Any,
            },
            None => items,
        };
        keyword_type(items).unwrap_or(DeclaredType::Any)
    }
}

fn descends(properties: &Map<String, Value>, declared_type: &DeclaredType) -> bool {
    !properties.is_empty() && matches!(declared_type, DeclaredType::Object | DeclaredType::Any)
}

fn keyword_type(schema: &Value) -> Option<DeclaredType> {
    let from_keyword = match schema.get("type") {
        Some(Value::String(name)) => DeclaredType::from_keyword(name),
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .filter(|name| *name != "null")
            .find_map(DeclaredType::from_keyword),
        _ => None,
    };
    from_keyword
        .or_else(|| schema.get("default").map(DeclaredType::of_value))
        .or_else(|| schema.get("const").map(DeclaredType::of_value))
}
