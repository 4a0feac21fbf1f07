//! # Violation Tree
//!
//! Validation failures are reported as a tree: a root node and a list of
//! causes, each of the same type. The tree is built so that
//!
//! - a single violation is the root itself, with no causes;
//! - several violations hang as causes under a document-level root.
//!
//! `required` failures at one instance location are grouped into a single
//! node whose [`ErrorContext::RequiredMissing`] lists every missing child
//! pointer in the order the schema declares them.

use std::fmt;

/// Typed context attached to a violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorContext {
    /// No structured context.
    Generic,
    /// One or more required properties are absent. Entries are full JSON
    /// Pointers of the missing children, first-declared first.
    RequiredMissing {
        /// Missing child pointers.
        missing: Vec<String>,
    },
}

impl ErrorContext {
    /// Pointer of the first missing property, for `RequiredMissing`.
    pub fn first_missing(&self) -> Option<&str> {
        match self {
            Self::Generic => None,
            Self::RequiredMissing { missing } => missing.first().map(String::as_str),
        }
    }
}

/// A node of the violation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// JSON Pointer of the offending location in the snapshot.
    pub instance_pointer: String,
    /// Human-readable description.
    pub message: String,
    /// Structured context.
    pub context: ErrorContext,
    /// Child violations.
    pub causes: Vec<ValidationError>,
}

impl ValidationError {
    /// A leaf violation with generic context.
    pub fn new(instance_pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            instance_pointer: instance_pointer.into(),
            message: message.into(),
            context: ErrorContext::Generic,
            causes: Vec::new(),
        }
    }

    /// Attach structured context.
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    /// Attach child violations.
    pub fn with_causes(mut self, causes: Vec<ValidationError>) -> Self {
        self.causes = causes;
        self
    }

    /// Assemble violations into a tree. Returns `None` when there are none.
    pub fn from_violations(schema_name: &str, mut violations: Vec<ValidationError>) -> Option<Self> {
        match violations.len() {
            0 => None,
            1 => violations.pop(),
            _ => Some(
                Self::new("", format!("configuration does not validate with {schema_name:?}"))
                    .with_causes(violations),
            ),
        }
    }

    /// Number of nodes in the tree, root included.
    pub fn node_count(&self) -> usize {
        1 + self.causes.iter().map(Self::node_count).sum::<usize>()
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let location = if self.instance_pointer.is_empty() {
            "(root)"
        } else {
            self.instance_pointer.as_str()
        };
        write!(f, "{:indent$}{location}: {}", "", self.message, indent = depth * 2)?;
        for cause in &self.causes {
            writeln!(f)?;
            cause.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 1)
    }
}

impl std::error::Error for ValidationError {}
