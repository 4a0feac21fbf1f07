//! # Pipeline Errors
//!
//! Every stage of the pipeline reports through [`ConfigValidationError`].
//! Load, compile and validation failures are distinct variants so that a
//! host can tell a broken schema from a broken configuration. None of
//! them are retried.
//!
//! Messages describe only their own level; underlying causes are reached
//! through `source()`.

use thiserror::Error;

use crate::tree::ValidationError;

/// Error from loading, compiling or validating against a schema.
#[derive(Error, Debug)]
pub enum ConfigValidationError {
    /// The HTTP request for the schema failed or returned a non-success status.
    #[error("failed to fetch schema from '{url}'")]
    Transport {
        /// Requested location.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP response body could not be read.
    #[error("failed to read schema response body from '{url}'")]
    ReadBody {
        /// Requested location.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// A file-backed schema could not be read.
    #[error("failed to read schema from '{location}'")]
    Io {
        /// Requested location.
        location: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The location is neither a supported URL nor a filesystem path.
    #[error("unsupported schema location '{location}': {reason}")]
    UnsupportedLocation {
        /// Requested location.
        location: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The schema bytes are not a JSON object graph the binder can walk.
    #[error("malformed schema '{name}'")]
    MalformedSchema {
        /// Resource name of the schema.
        name: String,
        /// What made it malformed.
        #[source]
        source: SchemaWalkError,
    },

    /// The schema is valid JSON but could not be compiled (invalid
    /// keyword values, unresolvable `$ref`, ...).
    #[error("schema compile error for '{name}': {reason}")]
    SchemaCompile {
        /// Resource name of the schema.
        name: String,
        /// Compiler message.
        reason: String,
    },

    /// The configuration snapshot violates the schema.
    #[error("configuration does not conform to schema '{schema_name}'")]
    Validation {
        /// Resource name of the schema.
        schema_name: String,
        /// Violation tree.
        #[source]
        error: ValidationError,
    },
}

impl ConfigValidationError {
    /// The violation tree, when this is a validation failure.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation { error, .. } => Some(error),
            _ => None,
        }
    }

    /// True for failures caused by the schema itself rather than by the
    /// configuration or the transport.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::MalformedSchema { .. } | Self::SchemaCompile { .. })
    }
}

/// Reason a schema cannot be walked for property paths.
#[derive(Error, Debug)]
pub enum SchemaWalkError {
    /// Not valid JSON.
    #[error("invalid JSON")]
    InvalidJson(#[from] serde_json::Error),

    /// The root schema is not an object.
    #[error("root schema must be an object, found {found}")]
    RootNotObject {
        /// JSON type found at the root.
        found: &'static str,
    },

    /// A `properties` keyword holds something other than an object.
    #[error("'properties' of '{path}' must be an object")]
    PropertiesNotObject {
        /// Dotted path of the schema whose keyword is malformed.
        path: String,
    },

    /// A property name contains the path separator and could not be told
    /// apart from a nested path.
    #[error("property '{name}' of '{parent}' contains '.', which dotted configuration keys cannot address")]
    DottedPropertyName {
        /// Dotted path of the enclosing schema (empty for the root).
        parent: String,
        /// The offending property name.
        name: String,
    },

    /// A local `$ref` points at nothing.
    #[error("reference '{reference}' does not resolve within the schema")]
    DanglingReference {
        /// The `$ref` value.
        reference: String,
    },
}
