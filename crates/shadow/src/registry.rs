//! Per-language shadow executor dispatch, plus the shadow-env helper table
//! installed by `/exe js = { helper1, helper2 }` (§4.4 "Shadow environment
//! registration": "Shadow envs are per-language, scoped to the defining
//! environment").

use crate::executor::{ExecRequest, ShadowExecutor};
use mlld_ast::Lang;
use mlld_errors::CommandError;
use mlld_value::{Executable, Value};
use std::collections::HashMap;

/// Helper executables registered for one language within one defining
/// environment. Cleared when that environment is destroyed — callers own
/// the lifetime by dropping the `ShadowEnv`, matching §4.4's "cleanup" note
/// (there's no process handle here to release; the only resource is this
/// table of already-evaluated `Executable` values).
#[derive(Debug, Clone, Default)]
pub struct ShadowEnv {
    helpers: Vec<(String, Executable)>,
}

impl ShadowEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, exec: Executable) {
        self.helpers.push((name.into(), exec));
    }

    pub fn helpers(&self) -> &[(String, Executable)] {
        &self.helpers
    }
}

/// Holds one `ShadowExecutor` per language for one interpreter invocation
/// (§9: "no process-wide state ... constructed per interpreter instance").
#[derive(Default)]
pub struct ShadowRegistry {
    executors: HashMap<Lang, Box<dyn ShadowExecutor>>,
}

impl ShadowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, executor: Box<dyn ShadowExecutor>) {
        self.executors.insert(executor.lang(), executor);
    }

    pub async fn run(&self, request: &ExecRequest) -> Result<Value, CommandError> {
        match self.executors.get(&request.lang) {
            Some(executor) => executor.execute(request).await,
            None => Err(CommandError::CommandFailed {
                exit_code: -1,
                stdout: String::new(),
                stderr: format!("no shadow executor installed for {:?}", request.lang),
            }),
        }
    }
}
