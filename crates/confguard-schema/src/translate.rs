//! # Error Translator
//!
//! Turns a [`ConfigValidationError`] into a flat mapping suitable for a
//! structured log entry. Validation failures are keyed by configuration
//! path rather than by JSON Pointer:
//!
//! ```text
//! [config_key=service.port] = one or more required properties are missing
//! config_file               = /etc/app/config.yaml
//! ```
//!
//! Only the root of the violation tree and its direct causes are
//! translated. Grandchildren are not visited.

use std::collections::BTreeMap;

use serde::Serialize;

use confguard_core::{pointer_to_dotted, ConfigProvider};

use crate::error::ConfigValidationError;
use crate::tree::{ErrorContext, ValidationError};

/// Field carrying the active configuration file.
pub const CONFIG_FILE_FIELD: &str = "config_file";

/// Field carrying a non-validation error.
pub const ERROR_FIELD: &str = "error";

/// Message reported for grouped `required` failures.
pub const REQUIRED_MISSING_MESSAGE: &str = "one or more required properties are missing";

/// Flat field name → message mapping. Later fields with the same name
/// overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TranslatedFields(BTreeMap<String, String>);

impl TranslatedFields {
    /// Message for one field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no field was produced.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The underlying map.
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }

    fn insert(&mut self, field: String, message: String) {
        self.0.insert(field, message);
    }
}

/// Log field name for a dotted configuration path.
pub fn config_key(dotted: &str) -> String {
    format!("[config_key={dotted}]")
}

/// Field name and message for one violation node.
///
/// A `required` node is reported at its first missing child. A pointer
/// that does not decode is used verbatim.
pub fn format_error_field(error: &ValidationError) -> (String, String) {
    let (pointer, message) = match &error.context {
        ErrorContext::RequiredMissing { missing } if !missing.is_empty() => {
            (missing[0].as_str(), REQUIRED_MISSING_MESSAGE.to_string())
        }
        ErrorContext::RequiredMissing { .. } | ErrorContext::Generic => {
            (error.instance_pointer.as_str(), error.message.clone())
        }
    };

    let key = match pointer_to_dotted(pointer) {
        Ok(dotted) => dotted,
        Err(e) => {
            tracing::debug!(pointer, error = %e, "keeping undecodable pointer as-is");
            pointer.to_string()
        }
    };
    (config_key(&key), message)
}

/// Translate an error for a structured log entry.
///
/// Non-validation errors produce a single [`ERROR_FIELD`]. Validation
/// errors produce one field for the root, one per direct cause, and
/// [`CONFIG_FILE_FIELD`].
pub fn translate_for_logging<P>(error: &ConfigValidationError, provider: &P) -> TranslatedFields
where
    P: ConfigProvider + ?Sized,
{
    let mut fields = TranslatedFields::default();

    let Some(tree) = error.as_validation() else {
        fields.insert(ERROR_FIELD.to_string(), render_chain(error));
        return fields;
    };

    let (key, message) = format_error_field(tree);
    fields.insert(key, message);

    let config_file = provider
        .config_file_used()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    fields.insert(CONFIG_FILE_FIELD.to_string(), config_file);

    for cause in &tree.causes {
        let (key, message) = format_error_field(cause);
        fields.insert(key, message);
    }
    fields
}

/// Translate `error` and emit it as `error`-level tracing events, one per
/// field.
pub fn log_validation_error<P>(error: &ConfigValidationError, provider: &P)
where
    P: ConfigProvider + ?Sized,
{
    let fields = translate_for_logging(error, provider);
    let config_file = fields.get(CONFIG_FILE_FIELD).unwrap_or_default();
    for (field, message) in fields.iter() {
        if field == CONFIG_FILE_FIELD {
            continue;
        }
        tracing::error!(field, config_file, "{message}");
    }
}

fn render_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use confguard_core::{LayeredConfig, MapEnv};

    fn provider() -> LayeredConfig {
        LayeredConfig::new().with_env(MapEnv::new())
    }

    fn validation(error: ValidationError) -> ConfigValidationError {
        ConfigValidationError::Validation {
            schema_name: "config.schema.json".to_string(),
            error,
        }
    }

    #[test]
    fn test_config_key_format() {
        assert_eq!(config_key("service.port"), "[config_key=service.port]");
        assert_eq!(config_key(""), "[config_key=]");
    }

    #[test]
    fn test_required_uses_first_missing() {
        let node = ValidationError::new("/service", "\"port\" is a required property").with_context(
            ErrorContext::RequiredMissing {
                missing: vec!["/service/port".into(), "/service/name".into()],
            },
        );
        let (key, message) = format_error_field(&node);
        assert_eq!(key, "[config_key=service.port]");
        assert_eq!(message, REQUIRED_MISSING_MESSAGE);
    }

    #[test]
    fn test_empty_missing_falls_back_to_instance() {
        let node = ValidationError::new("/service", "raw")
            .with_context(ErrorContext::RequiredMissing { missing: vec![] });
        assert_eq!(
            format_error_field(&node),
            ("[config_key=service]".to_string(), "raw".to_string())
        );
    }

    #[test]
    fn test_undecodable_pointer_kept_raw() {
        let node = ValidationError::new("/bad~2escape", "oops");
        let (key, _) = format_error_field(&node);
        assert_eq!(key, "[config_key=/bad~2escape]");
    }

    #[test]
    fn test_single_violation_fields() {
        let err = validation(ValidationError::new("/service/port", "\"abc\" is not of type \"integer\""));
        let fields = translate_for_logging(&err, &provider());
        assert_eq!(fields.len(), 2);
        assert_eq!(
            fields.get("[config_key=service.port]"),
            Some("\"abc\" is not of type \"integer\"")
        );
        assert_eq!(fields.get(CONFIG_FILE_FIELD), Some(""));
    }

    #[test]
    fn test_causes_one_level_only() {
        let grandchild = ValidationError::new("/x/y/z", "deep");
        let child = ValidationError::new("/x/y", "mid").with_causes(vec![grandchild]);
        let root = ValidationError::new("", "top").with_causes(vec![child]);
        let fields = translate_for_logging(&validation(root), &provider());
        assert_eq!(fields.get("[config_key=]"), Some("top"));
        assert_eq!(fields.get("[config_key=x.y]"), Some("mid"));
        assert_eq!(fields.get("[config_key=x.y.z]"), None);
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_duplicate_field_overwrites() {
        let root = ValidationError::new("", "top").with_causes(vec![
            ValidationError::new("/a", "first"),
            ValidationError::new("/a", "second"),
        ]);
        let fields = translate_for_logging(&validation(root), &provider());
        assert_eq!(fields.get("[config_key=a]"), Some("second"));
    }

    #[test]
    fn test_non_validation_error_single_field() {
        let err = ConfigValidationError::SchemaCompile {
            name: "s.json".into(),
            reason: "bad keyword".into(),
        };
        let fields = translate_for_logging(&err, &provider());
        assert_eq!(fields.len(), 1);
        assert!(fields.get(ERROR_FIELD).unwrap().contains("bad keyword"));
    }

    #[test]
    fn test_error_chain_renders_each_cause_once() {
        let mut config = provider();
        let err = crate::validate(&mut config, "x.json", b"{ not json").unwrap_err();
        let fields = translate_for_logging(&err, &config);
        let rendered = fields.get(ERROR_FIELD).unwrap();

        let cause = serde_json::from_slice::<serde_json::Value>(b"{ not json")
            .unwrap_err()
            .to_string();
        assert_eq!(rendered.matches(cause.as_str()).count(), 1, "rendered: {rendered}");
        assert_eq!(rendered.matches("invalid JSON").count(), 1, "rendered: {rendered}");
        assert_eq!(rendered, format!("malformed schema 'x.json': invalid JSON: {cause}"));
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let err = validation(ValidationError::new("/a", "m"));
        let fields = translate_for_logging(&err, &provider());
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json, serde_json::json!({"[config_key=a]": "m", "config_file": ""}));
    }
}
