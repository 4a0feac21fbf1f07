//! # Error Types
//!
//! Errors raised by the foundational layer. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.
//!
//! - [`PointerError`] is produced when a JSON Pointer cannot be expressed
//!   in dotted notation. Callers that only need a display key degrade to
//!   the raw pointer instead of propagating it.
//! - [`ConfigError`] covers loading configuration files into the
//!   reference [`LayeredConfig`](crate::LayeredConfig) provider.

use thiserror::Error;

/// A JSON Pointer could not be converted to dotted notation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// The pointer neither starts with `/` nor is a `#`-anchored fragment.
    /// Remote references (`https://host/doc#/a`) fall in this category.
    #[error("JSON pointer must be empty or start with '/' or '#/': {0:?}")]
    Unanchored(String),

    /// A `~` in a segment is not followed by `0` or `1`.
    #[error("invalid escape sequence in segment {segment:?} of JSON pointer {pointer:?}")]
    InvalidEscape {
        /// The full pointer being converted.
        pointer: String,
        /// The offending raw segment.
        segment: String,
    },
}

/// Error loading configuration into the reference provider.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("config file read error for '{path}'")]
    FileRead {
        /// Path of the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON or YAML.
    #[error("config file parse error for '{path}': {reason}")]
    FileParse {
        /// Path of the file.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// The file extension is not one of the supported formats.
    #[error("unsupported config file format for '{path}': expected .json, .yaml or .yml")]
    UnsupportedFormat {
        /// Path of the file.
        path: String,
    },

    /// The top-level document is not a mapping.
    #[error("config file '{path}' must contain a mapping at the top level, found {found}")]
    NotAMapping {
        /// Path of the file.
        path: String,
        /// JSON type name that was found instead.
        found: &'static str,
    },
}
