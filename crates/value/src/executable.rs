//! Callable values produced by `/exe` (§3.1, §4.4).

use crate::value::Value;
use indexmap::IndexMap;
use mlld_ast::ExecBody;
use std::collections::BTreeSet;
use std::rc::Rc;

/// A read-only snapshot of all bindings visible at the moment an executable
/// was exported, so it can later resolve names against its defining module
/// instead of the caller's environment (§3.2 "Captured module environment").
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleSnapshot {
    pub bindings: IndexMap<String, Value>,
}

impl ModuleSnapshot {
    pub fn new(bindings: IndexMap<String, Value>) -> Self {
        Self { bindings }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }
}

/// A named callable bound by `/exe` (§4.4). Body evaluation itself is
/// dispatched by `mlld_eval`; this type only carries the static shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Executable {
    pub name: String,
    pub params: Vec<String>,
    pub body: ExecBody,
    pub labels: BTreeSet<String>,
    /// `None` for executables defined at the top level of the program being
    /// directly evaluated (not via import); `Some` once captured for export.
    pub captured_env: Option<Rc<ModuleSnapshot>>,
}

impl Executable {
    pub fn new(name: impl Into<String>, params: Vec<String>, body: ExecBody) -> Self {
        Self {
            name: name.into(),
            params,
            body,
            labels: BTreeSet::new(),
            captured_env: None,
        }
    }

    pub fn with_labels(mut self, labels: impl IntoIterator<Item = String>) -> Self {
        self.labels.extend(labels);
        self
    }

    pub fn with_capture(mut self, snapshot: Rc<ModuleSnapshot>) -> Self {
        self.captured_env = Some(snapshot);
        self
    }
}
