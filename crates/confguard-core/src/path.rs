//! # Configuration Paths
//!
//! The configuration provider addresses values with dotted keys
//! (`service.port`); JSON Schema validators report locations as JSON
//! Pointers (`/service/port`, RFC 6901). This module owns the newtype for
//! the former and the conversion in both directions.
//!
//! Pointer segments are unescaped (`~1` → `/`, `~0` → `~`) before they are
//! joined with `.`. A segment that itself contains a `.` therefore cannot
//! be told apart from two segments once converted; such keys are not
//! addressable through the dotted notation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PointerError;

/// Separator of the dotted key notation.
pub const PATH_SEPARATOR: char = '.';

/// A dotted configuration key such as `service.port`.
///
/// The empty path denotes the document root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigPath(String);

impl ConfigPath {
    /// Wrap a dotted key. No normalization is applied.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The document root.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Build a path from individual segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = String::new();
        for segment in segments {
            if !path.is_empty() {
                path.push(PATH_SEPARATOR);
            }
            path.push_str(segment.as_ref());
        }
        Self(path)
    }

    /// Parse a JSON Pointer into a dotted path.
    pub fn from_pointer(pointer: &str) -> Result<Self, PointerError> {
        pointer_to_dotted(pointer).map(Self)
    }

    /// The dotted representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the document root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the segments. The root has none.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        let root = self.0.is_empty();
        self.0.split(PATH_SEPARATOR).filter(move |_| !root)
    }

    /// Append a child segment.
    pub fn join(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            Self(segment.to_string())
        } else {
            Self(format!("{}{PATH_SEPARATOR}{segment}", self.0))
        }
    }

    /// True when `other` lies strictly below `self`.
    pub fn is_ancestor_of(&self, other: &ConfigPath) -> bool {
        if self.0.is_empty() {
            return !other.0.is_empty();
        }
        other
            .0
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with(PATH_SEPARATOR))
    }

    /// The equivalent JSON Pointer.
    pub fn to_pointer(&self) -> String {
        dotted_to_pointer(&self.0)
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for ConfigPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// Convert a JSON Pointer to dotted notation.
///
/// Accepts plain pointers (`/a/b`), `#`-anchored fragments (`#/a/b`) and
/// the root forms `""` and `"#"`, which map to the empty path.
///
/// # Errors
///
/// Returns [`PointerError::Unanchored`] for anything else (including
/// remote references) and [`PointerError::InvalidEscape`] for a `~` not
/// followed by `0` or `1`.
pub fn pointer_to_dotted(pointer: &str) -> Result<String, PointerError> {
    let body = pointer.strip_prefix('#').unwrap_or(pointer);
    if body.is_empty() {
        return Ok(String::new());
    }
    let Some(body) = body.strip_prefix('/') else {
        return Err(PointerError::Unanchored(pointer.to_string()));
    };

    let mut segments = Vec::new();
    for raw in body.split('/') {
        let segment = unescape_segment(raw).ok_or_else(|| PointerError::InvalidEscape {
            pointer: pointer.to_string(),
            segment: raw.to_string(),
        })?;
        segments.push(segment);
    }
    Ok(segments.join("."))
}

/// Convert a dotted path to a JSON Pointer. The empty path maps to `""`.
pub fn dotted_to_pointer(dotted: &str) -> String {
    if dotted.is_empty() {
        return String::new();
    }
    let mut pointer = String::with_capacity(dotted.len() + 1);
    for segment in dotted.split(PATH_SEPARATOR) {
        pointer.push('/');
        pointer.push_str(&escape_segment(segment));
    }
    pointer
}

/// Escape one segment for use inside a JSON Pointer.
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape_segment(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}
