//! The seam between this crate (which owns retry/attempt bookkeeping) and
//! whatever actually runs a stage's executable body. Defined here rather
//! than depended on, because the real implementation lives in mlld-eval,
//! which in turn depends on this crate for the pipeline engine — a
//! `StageInvoker` trait breaks what would otherwise be a cycle.

use crate::context::{PipelineVars, StageContext};
use async_trait::async_trait;
use mlld_errors::EvalError;
use mlld_value::Value;

/// One condensed-pipe or parenthesized stage: the exec name to call plus
/// any extra positional arguments written after it (the threaded value is
/// always prepended by the engine, not listed here).
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub exec_name: String,
    pub args: Vec<Value>,
}

impl StageSpec {
    pub fn new(exec_name: impl Into<String>) -> Self {
        Self {
            exec_name: exec_name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }
}

/// What invoking one stage produced.
#[derive(Debug, Clone)]
pub enum StageResult {
    Complete(Value),
    /// The stage body requested re-execution of the previous stage
    /// (§4.6: "stage N may request re-execution of stage N−1 only").
    RetryUpstream,
}

// `?Send`: the real implementation (`mlld_eval::EvalInvoker`) closes over an
// `&mut EvalContext`, which itself holds `Rc`s (executables, the program
// parser) — never sent across threads, so there's no reason to pay for
// `Send` futures here.
#[async_trait(?Send)]
pub trait StageInvoker {
    /// Invoke the transformer at `stage_index` (1-indexed) with `input`
    /// threaded in and `ctx`/`@pipeline` bound in its local scope.
    async fn invoke_transformer(
        &self,
        stage_index: usize,
        spec: &StageSpec,
        input: &Value,
        ctx: &StageContext,
        pipeline: &PipelineVars,
    ) -> Result<StageResult, EvalError>;

    /// Re-run the expression that produced the pipeline's source value.
    /// Only ever called when that value's `meta.retryable` is `true`.
    async fn reinvoke_source(&self) -> Result<Value, EvalError>;
}
