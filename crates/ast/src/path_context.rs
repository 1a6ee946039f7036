//! The `PathContext` the (out-of-scope) parser/loader hands to the core
//! alongside a parsed [`crate::Program`].

use std::path::PathBuf;

/// Path roots available while evaluating `/path`, `@base`, and relative
/// file references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathContext {
    /// Root of the enclosing mlld project (where `mlld.lock.json` lives).
    pub project_root: PathBuf,
    /// Directory containing the file currently being evaluated.
    pub file_dir: PathBuf,
    /// Directory the interpreter was invoked from.
    pub invocation_dir: PathBuf,
}

impl PathContext {
    pub fn new(
        project_root: impl Into<PathBuf>,
        file_dir: impl Into<PathBuf>,
        invocation_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            file_dir: file_dir.into(),
            invocation_dir: invocation_dir.into(),
        }
    }

    /// A `PathContext` where all three roots coincide, useful for tests and
    /// single-file/dynamic-module evaluation.
    pub fn single(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            project_root: dir.clone(),
            file_dir: dir.clone(),
            invocation_dir: dir,
        }
    }
}
