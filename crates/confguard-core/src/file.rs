//! # Configuration Files
//!
//! Reads JSON or YAML configuration files into a `serde_json::Value`
//! tree. The format is chosen from the file extension.

use std::path::Path;

use serde_json::Value;

use crate::error::ConfigError;

/// Load a configuration file and return its top-level mapping.
///
/// An empty YAML document is treated as an empty mapping. Integer
/// mapping keys (`404:`) become JSON string keys.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read, has an unknown
/// extension, does not parse, or is not a mapping at the top level.
pub fn load_config_file(path: &Path) -> Result<Value, ConfigError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: display.clone(),
        source,
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let value = match ext {
        "json" => serde_json::from_str::<Value>(&content).map_err(|e| ConfigError::FileParse {
            path: display.clone(),
            reason: format!("invalid JSON: {e}"),
        })?,
        "yaml" | "yml" => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
                    path: display.clone(),
                    reason: format!("invalid YAML: {e}"),
                })?;
            serde_json::to_value(&yaml).map_err(|e| ConfigError::FileParse {
                path: display.clone(),
                reason: format!("YAML has no JSON representation: {e}"),
            })?
        }
        _ => return Err(ConfigError::UnsupportedFormat { path: display }),
    };

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(serde_json::Map::new())),
        other => Err(ConfigError::NotAMapping {
            path: display,
            found: json_type_name(&other),
        }),
    }
}

/// Name of the JSON type of `value`, as used in schema `type` keywords.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.yaml", "service:\n  port: 8080\n  hosts: [a, b]\n");
        let value = load_config_file(&path).unwrap();
        assert_eq!(value["service"]["port"], 8080);
        assert_eq!(value["service"]["hosts"][1], "b");
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.json", r#"{"log": {"level": "debug"}}"#);
        let value = load_config_file(&path).unwrap();
        assert_eq!(value["log"]["level"], "debug");
    }

    #[test]
    fn test_empty_yaml_is_empty_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.yml", "");
        let value = load_config_file(&path).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn test_yaml_numeric_keys_stringified() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.yaml", "codes:\n  404: missing\n");
        let value = load_config_file(&path).unwrap();
        assert_eq!(value["codes"]["404"], "missing");
    }

    #[test]
    fn test_yaml_nested_sequences_and_floats() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.yaml", "limits:\n  - max: 1.5\n    name: cpu\n");
        let value = load_config_file(&path).unwrap();
        assert_eq!(value["limits"][0]["max"], 1.5);
        assert_eq!(value["limits"][0]["name"], "cpu");
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.yaml", "a: [1, 2\n");
        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::FileParse { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.ini", "a=1");
        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_rejects_non_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.json", "[1, 2]");
        match load_config_file(&path) {
            Err(ConfigError::NotAMapping { found, .. }) => assert_eq!(found, "array"),
            other => panic!("expected NotAMapping, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_config_file(Path::new("/nonexistent/confguard.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
