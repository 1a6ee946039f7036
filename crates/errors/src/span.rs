//! Source location tracking carried on every error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a parsed mlld program.
///
/// Parsing itself is out of scope for the interpreter core, but the AST
/// collaborator attaches a `SourceSpan` to nodes it produces so the core can
/// report useful diagnostics without re-deriving position information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl SourceSpan {
    pub fn new(file: impl Into<Option<String>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// A span with no file association, e.g. for dynamically-constructed ASTs.
    pub fn unknown() -> Self {
        Self {
            file: None,
            line: 0,
            column: 0,
        }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}:{}:{}", self.line, self.column),
            None => write!(f, "<unknown>:{}:{}", self.line, self.column),
        }
    }
}

/// One frame of directive-execution context, used to build the stack shown
/// in the bordered error box (see `mlld_interp::render`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub description: String,
    pub location: Option<SourceSpan>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{} ({loc})", self.description),
            None => write!(f, "{}", self.description),
        }
    }
}
