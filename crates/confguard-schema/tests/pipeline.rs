//! End-to-end validation of file, default and environment layers against
//! a schema, through to translated log fields.

use std::io::Write;

use serde_json::json;

use confguard_core::{ConfigPath, ConfigProvider, DeclaredType, LayeredConfig, MapEnv};
use confguard_schema::{
    bind_environment, translate_for_logging, validate, ConfigValidationError, ErrorContext,
    CONFIG_FILE_FIELD, ERROR_FIELD, REQUIRED_MISSING_MESSAGE,
};

const SERVICE_SCHEMA: &str = r#"{
    "$schema": "https://json-schema.org/draft/2020-12/schema",
    "type": "object",
    "properties": {
        "service": {
            "type": "object",
            "properties": {
                "host": {"type": "string"},
                "port": {"type": "integer", "minimum": 1, "maximum": 65535}
            },
            "required": ["port"]
        },
        "debug": {"type": "boolean"},
        "tags": {"type": "array", "items": {"type": "string"}}
    },
    "required": ["service"]
}"#;

const NESTED_SCHEMA: &str = r#"{
    "type": "object",
    "properties": {
        "a": {
            "type": "object",
            "properties": {"b": {"type": "string"}},
            "required": ["b"]
        },
        "c": {
            "type": "object",
            "properties": {"d": {"type": "integer"}}
        }
    }
}"#;

fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn config_from_file(file: &tempfile::NamedTempFile, env: MapEnv) -> LayeredConfig {
    let mut config = LayeredConfig::new().with_env(env);
    config.load_file(file.path()).unwrap();
    config
}

#[test]
fn conforming_configuration_passes() {
    let file = write_yaml("service:\n  host: localhost\n  port: 8080\ndebug: false\n");
    let mut config = config_from_file(&file, MapEnv::new());
    validate(&mut config, "config.schema.json", SERVICE_SCHEMA.as_bytes()).unwrap();
}

#[test]
fn missing_required_port_reported_at_its_config_key() {
    let file = write_yaml("service:\n  host: localhost\n");
    let mut config = config_from_file(&file, MapEnv::new());

    let err = validate(&mut config, "config.schema.json", SERVICE_SCHEMA.as_bytes()).unwrap_err();
    let tree = err.as_validation().expect("validation failure");
    assert_eq!(tree.context.first_missing(), Some("/service/port"));

    let fields = translate_for_logging(&err, &config);
    assert_eq!(fields.len(), 2, "fields: {fields:?}");
    assert_eq!(
        fields.get("[config_key=service.port]"),
        Some(REQUIRED_MISSING_MESSAGE)
    );
    assert_eq!(
        fields.get(CONFIG_FILE_FIELD),
        Some(file.path().display().to_string().as_str())
    );
}

#[test]
fn wrong_type_reported_at_its_config_key() {
    let file = write_yaml("service:\n  port: abc\n");
    let mut config = config_from_file(&file, MapEnv::new());

    let err = validate(&mut config, "config.schema.json", SERVICE_SCHEMA.as_bytes()).unwrap_err();
    let tree = err.as_validation().unwrap();
    assert_eq!(tree.instance_pointer, "/service/port");
    assert_eq!(tree.context, ErrorContext::Generic);

    let fields = translate_for_logging(&err, &config);
    assert_eq!(fields.len(), 2);
    let message = fields.get("[config_key=service.port]").unwrap();
    assert!(message.contains("integer"), "message: {message}");
}

#[test]
fn multiple_violations_produce_sibling_fields() {
    let file = write_yaml("a: {}\nc:\n  d: x\n");
    let mut config = config_from_file(&file, MapEnv::new());

    let err = validate(&mut config, "nested.schema.json", NESTED_SCHEMA.as_bytes()).unwrap_err();
    let tree = err.as_validation().unwrap();
    assert_eq!(tree.instance_pointer, "");
    assert_eq!(tree.causes.len(), 2);

    let fields = translate_for_logging(&err, &config);
    assert_eq!(fields.len(), 4, "fields: {fields:?}");
    assert!(fields.get("[config_key=]").unwrap().contains("nested.schema.json"));
    assert_eq!(fields.get("[config_key=a.b]"), Some(REQUIRED_MISSING_MESSAGE));
    assert!(fields.get("[config_key=c.d]").unwrap().contains("integer"));
    assert!(fields.get(CONFIG_FILE_FIELD).is_some());
}

#[test]
fn environment_supplies_missing_value() {
    let file = write_yaml("service:\n  host: localhost\n");
    let env = MapEnv::new().with("SERVICE_PORT", "9090").with("DEBUG", "true");
    let mut config = config_from_file(&file, env);

    validate(&mut config, "config.schema.json", SERVICE_SCHEMA.as_bytes()).unwrap();

    let port = config.get(&ConfigPath::new("service.port")).unwrap();
    assert_eq!(port.value, json!("9090"));
}

#[test]
fn environment_overrides_file_value() {
    let file = write_yaml("service:\n  port: 0\n");
    let env = MapEnv::new().with("SERVICE_PORT", "443");
    let mut config = config_from_file(&file, env);
    validate(&mut config, "config.schema.json", SERVICE_SCHEMA.as_bytes()).unwrap();
}

#[test]
fn uncoercible_environment_value_is_a_type_violation() {
    let env = MapEnv::new().with("SERVICE_PORT", "abc");
    let mut config = LayeredConfig::new().with_env(env);

    let err = validate(&mut config, "config.schema.json", SERVICE_SCHEMA.as_bytes()).unwrap_err();
    let fields = translate_for_logging(&err, &config);
    assert!(fields.get("[config_key=service.port]").unwrap().contains("integer"));
    assert_eq!(fields.get(CONFIG_FILE_FIELD), Some(""));
}

#[test]
fn environment_array_is_split() {
    let env = MapEnv::new()
        .with("SERVICE_PORT", "80")
        .with("TAGS", "blue,green");
    let mut config = LayeredConfig::new().with_env(env);
    validate(&mut config, "config.schema.json", SERVICE_SCHEMA.as_bytes()).unwrap();
    assert_eq!(
        config.binding(&ConfigPath::new("tags")).unwrap().declared_type,
        DeclaredType::Array(Box::new(DeclaredType::String))
    );
}

#[test]
fn prefixed_environment_variables() {
    let env = MapEnv::new()
        .with("SERVICE_PORT", "abc")
        .with("APP_SERVICE_PORT", "8443");
    let mut config = LayeredConfig::new().with_env(env).with_env_prefix("APP");

    validate(&mut config, "config.schema.json", SERVICE_SCHEMA.as_bytes()).unwrap();
    assert_eq!(
        config.binding(&ConfigPath::new("service.port")).unwrap().env_var,
        "APP_SERVICE_PORT"
    );
}

#[test]
fn binding_twice_is_the_same_as_once() {
    let mut config = LayeredConfig::new().with_env(MapEnv::new());
    let first = bind_environment(&mut config, SERVICE_SCHEMA.as_bytes()).unwrap();
    let bindings_after_first = config.bindings().len();
    let second = bind_environment(&mut config, SERVICE_SCHEMA.as_bytes()).unwrap();

    assert_eq!(first, 4);
    assert_eq!(second, 0);
    assert_eq!(config.bindings().len(), bindings_after_first);
}

#[test]
fn repeated_validation_sees_updated_state() {
    let mut config = LayeredConfig::new().with_env(MapEnv::new());
    assert!(validate(&mut config, "config.schema.json", SERVICE_SCHEMA.as_bytes()).is_err());

    config.set("service.port", json!(8080));
    validate(&mut config, "config.schema.json", SERVICE_SCHEMA.as_bytes()).unwrap();
}

#[test]
fn schema_errors_are_distinct_from_validation_errors() {
    let mut config = LayeredConfig::new().with_env(MapEnv::new());

    let malformed = validate(&mut config, "broken.json", b"{ not json").unwrap_err();
    assert!(matches!(malformed, ConfigValidationError::MalformedSchema { .. }));

    let uncompilable = validate(&mut config, "broken.json", br#"{"type": "no-such-type"}"#).unwrap_err();
    assert!(matches!(uncompilable, ConfigValidationError::SchemaCompile { .. }));

    let fields = translate_for_logging(&uncompilable, &config);
    assert_eq!(fields.len(), 1);
    assert!(fields.get(ERROR_FIELD).is_some());
}

#[test]
fn external_reference_fails_compilation() {
    let schema = br#"{"properties": {"ext": {"$ref": "https://example.invalid/ext.json"}}}"#;
    let mut config = LayeredConfig::new().with_env(MapEnv::new());

    let err = validate(&mut config, "x.json", schema).unwrap_err();
    assert!(
        matches!(err, ConfigValidationError::SchemaCompile { .. }),
        "Expected SchemaCompile, got: {err}"
    );
    assert!(err.is_schema_error());
    assert!(err.as_validation().is_none());
}

#[test]
fn reference_to_own_url_name_resolves() {
    let name = "https://host/schemas/config.schema.json";
    let schema = r#"{
        "$defs": {"port": {"type": "integer"}},
        "properties": {
            "port": {"$ref": "https://host/schemas/config.schema.json#/$defs/port"}
        },
        "required": ["port"]
    }"#;

    let mut config = LayeredConfig::new().with_env(MapEnv::new());
    config.set("port", json!(8080));
    validate(&mut config, name, schema.as_bytes()).unwrap();

    config.set("port", json!("abc"));
    let err = validate(&mut config, name, schema.as_bytes()).unwrap_err();
    assert_eq!(err.as_validation().unwrap().instance_pointer, "/port");
}

#[test]
fn dotted_property_name_is_a_schema_error() {
    let schema = br#"{"properties": {"a.b": {"type": "integer"}}, "required": ["a.b"]}"#;
    let mut config = LayeredConfig::new().with_env(MapEnv::new().with("A_B", "1"));

    let err = validate(&mut config, "dotted.json", schema).unwrap_err();
    assert!(matches!(err, ConfigValidationError::MalformedSchema { .. }));
    assert!(config.bindings().is_empty());

    let fields = translate_for_logging(&err, &config);
    assert!(fields.get(ERROR_FIELD).unwrap().contains("'a.b'"));
}
