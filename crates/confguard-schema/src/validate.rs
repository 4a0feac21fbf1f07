//! # Schema Compiler & Validator
//!
//! Runs the pipeline for one schema against one provider:
//!
//! 1. bind every schema-declared leaf path to its environment variable;
//! 2. compile the schema under its resource name;
//! 3. snapshot the provider;
//! 4. validate the snapshot.
//!
//! Binding happens first so the snapshot sees environment overrides for
//! keys that appear nowhere else. Each call binds, compiles and snapshots
//! afresh; nothing is cached between calls.
//!
//! ## Schema Resolution
//!
//! The compiled schema may reference itself by its resource name. Any
//! other external `$ref` is unresolvable and fails compilation; no
//! network requests are made while compiling.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Retrieve, Uri, Validator};
use serde_json::Value;

use confguard_core::path::escape_segment;
use confguard_core::ConfigProvider;

use crate::binder::bind_environment;
use crate::error::ConfigValidationError;
use crate::loader::{load_from_bytes, SchemaDocument, SchemaLoader};
use crate::snapshot::{snapshot, ConfigurationSnapshot};
use crate::tree::{ErrorContext, ValidationError};

/// Retriever that only knows the schema being compiled.
struct SelfRetriever {
    name: String,
    document: Value,
}

impl Retrieve for SelfRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let requested = uri.as_str();
        let requested = requested.split('#').next().unwrap_or(requested);

        if requested == self.name || requested.ends_with(&format!("/{}", self.name)) {
            return Ok(self.document.clone());
        }
        Err(format!("unresolvable reference '{requested}' (only '{}' is available)", self.name).into())
    }
}

/// Compile a schema document.
///
/// # Errors
///
/// Returns [`ConfigValidationError::MalformedSchema`] if the bytes are not
/// JSON and [`ConfigValidationError::SchemaCompile`] if the compiler
/// rejects the schema.
pub fn compile_schema(document: &SchemaDocument) -> Result<Validator, ConfigValidationError> {
    let value: Value = serde_json::from_slice(document.content()).map_err(|e| {
        ConfigValidationError::MalformedSchema {
            name: document.name().to_string(),
            source: e.into(),
        }
    })?;

    let retriever = SelfRetriever {
        name: document.name().to_string(),
        document: value.clone(),
    };

    jsonschema::options()
        .with_retriever(retriever)
        .build(&value)
        .map_err(|e| ConfigValidationError::SchemaCompile {
            name: document.name().to_string(),
            reason: e.to_string(),
        })
}

/// Validate the provider's current configuration against a schema.
///
/// # Errors
///
/// - [`ConfigValidationError::MalformedSchema`] if the schema cannot be
///   walked; no environment binding is registered in that case.
/// - [`ConfigValidationError::SchemaCompile`] if it does not compile.
/// - [`ConfigValidationError::Validation`] if the configuration violates it.
pub fn validate<P>(provider: &mut P, name: &str, content: &[u8]) -> Result<(), ConfigValidationError>
where
    P: ConfigProvider + ?Sized,
{
    bind_environment(provider, content).map_err(|source| ConfigValidationError::MalformedSchema {
        name: name.to_string(),
        source,
    })?;

    let document = load_from_bytes(name, content);
    let validator = compile_schema(&document)?;

    let snapshot = snapshot(provider);
    match validate_snapshot(&validator, name, &snapshot) {
        Ok(()) => {
            tracing::info!(schema = name, keys = snapshot.len(), "configuration conforms to schema");
            Ok(())
        }
        Err(error) => {
            tracing::info!(
                schema = name,
                violations = error.node_count(),
                "configuration does not conform to schema"
            );
            Err(ConfigValidationError::Validation {
                schema_name: name.to_string(),
                error,
            })
        }
    }
}

/// Load a schema from `location` and validate against it. The location
/// doubles as the schema's resource name.
///
/// # Errors
///
/// Any loader error, plus everything [`validate`] returns.
pub async fn validate_from_url<P>(
    loader: &SchemaLoader,
    provider: &mut P,
    location: &str,
) -> Result<(), ConfigValidationError>
where
    P: ConfigProvider + ?Sized,
{
    let document = loader.load_from_url(location).await?;
    validate(provider, document.name(), document.content())
}

/// Validate an already-captured snapshot with a compiled validator.
///
/// # Errors
///
/// Returns the violation tree when the snapshot does not conform.
pub fn validate_snapshot(
    validator: &Validator,
    schema_name: &str,
    snapshot: &ConfigurationSnapshot,
) -> Result<(), ValidationError> {
    let instance = snapshot.to_json_value();
    let violations = collect_violations(validator, &instance);
    match ValidationError::from_violations(schema_name, violations) {
        None => Ok(()),
        Some(tree) => Err(tree),
    }
}

/// Turn the validator's flat error stream into tree nodes, grouping
/// `required` failures that share an instance location.
fn collect_violations(validator: &Validator, instance: &Value) -> Vec<ValidationError> {
    let mut violations: Vec<ValidationError> = Vec::new();

    for error in validator.iter_errors(instance) {
        let pointer = error.instance_path.to_string();
        let message = error.to_string();

        let ValidationErrorKind::Required { property } = &error.kind else {
            violations.push(ValidationError::new(pointer, message));
            continue;
        };

        let child = match property {
            Value::String(name) => escape_segment(name),
            other => escape_segment(&other.to_string()),
        };
        let missing_pointer = format!("{pointer}/{child}");

        let grouped = violations.iter_mut().find(|v| {
            v.instance_pointer == pointer && matches!(v.context, ErrorContext::RequiredMissing { .. })
        });
        match grouped {
            Some(existing) => {
                if let ErrorContext::RequiredMissing { missing } = &mut existing.context {
                    missing.push(missing_pointer);
                }
                existing.message.push_str("; ");
                existing.message.push_str(&message);
            }
            None => violations.push(
                ValidationError::new(pointer, message).with_context(ErrorContext::RequiredMissing {
                    missing: vec![missing_pointer],
                }),
            ),
        }
    }

    violations
}
