//! # confguard-schema: Configuration Schema Validation
//!
//! Validates a live, merged configuration against a JSON Schema and
//! reports violations keyed by configuration path.
//!
//! ## Pipeline
//!
//! Loader → Binder → Snapshotter → Validator → Translator:
//!
//! - [`loader`]: schema bytes from a buffer, a URL or a file.
//! - [`binder`]: registers an environment override for every leaf path
//!   the schema declares.
//! - [`snapshot`]: the provider's merged view, with environment strings
//!   coerced to their declared types.
//! - [`validate`]: compiles the schema and validates the snapshot into a
//!   [`ValidationError`] tree.
//! - [`translate`]: flattens the tree into `[config_key=...]` log fields.
//!
//! ## Crate Policy
//!
//! - Depends only on `confguard-core` internally.
//! - The configuration store is reached through
//!   [`confguard_core::ConfigProvider`]; there is no global instance.
//! - Nothing is cached between validation calls and nothing is retried.

pub mod binder;
pub mod error;
pub mod loader;
pub mod snapshot;
pub mod translate;
pub mod tree;
pub mod validate;

pub use binder::{bind_environment, list_schema_paths, SchemaPath};
pub use error::{ConfigValidationError, SchemaWalkError};
pub use loader::{load_from_bytes, SchemaDocument, SchemaLoader};
pub use snapshot::{snapshot, ConfigurationSnapshot};
pub use translate::{
    config_key, format_error_field, log_validation_error, translate_for_logging, TranslatedFields,
    CONFIG_FILE_FIELD, ERROR_FIELD, REQUIRED_MISSING_MESSAGE,
};
pub use tree::{ErrorContext, ValidationError};
pub use validate::{compile_schema, validate, validate_from_url, validate_snapshot};
