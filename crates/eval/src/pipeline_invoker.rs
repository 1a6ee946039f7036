//! The evaluator-side half of the pipeline seam (§4.6): implements
//! `mlld_pipeline::StageInvoker` by calling back into `exec.rs`/`expr.rs`,
//! and installs `@ctx`/`@pipeline`/`@input` into each stage's local scope.

use crate::context::EvalContext;
use mlld_ast::{Expr, PipelineStage};
use mlld_env::{EnvHandle, EnvKind, ReservedValue};
use mlld_errors::EvalError;
use mlld_pipeline::{PipelineEngine, PipelineVars, StageContext, StageInvoker, StageResult, StageSpec};
use mlld_value::{Executable, Value, ValueKind};
use std::cell::RefCell;
use std::rc::Rc;

/// Evaluate a full `source | stage1 | stage2` pipe expression (§4.3): the
/// source is a general expression (re-evaluable on retry iff its result
/// carries `retryable = true`), and every stage is one condensed-pipe
/// entry.
pub async fn run_pipe(
    ctx: &mut EvalContext,
    handle: EnvHandle,
    source: &Expr,
    stages: &[PipelineStage],
) -> Result<Value, EvalError> {
    let initial = crate::expr::eval_expr(ctx, handle, source).await?;
    let specs = build_specs(stages);
    let invoker = EvalInvoker {
        ctx: RefCell::new(ctx),
        handle,
        stages,
        reinvoke: Reinvoke::Source(source),
    };
    let mut engine = PipelineEngine::new();
    engine.run(initial, &specs, &invoker).await.map_err(EvalError::from)
}

/// Evaluate one stage of a condensed pipe already attached to a computed
/// value (`/var` results, template interpolations, file loads — §4.2). The
/// value that was threaded in plays the role of "stage 0"'s output; a
/// retry request against it is only honored when that value is itself
/// `retryable` (§4.6 "stage 0 may be re-executed only if its source value
/// carries retryable=true").
pub async fn run_condensed_stage(
    ctx: &mut EvalContext,
    handle: EnvHandle,
    stage: &PipelineStage,
    input: Value,
) -> Result<Value, EvalError> {
    let single = std::slice::from_ref(stage);
    let specs = build_specs(single);
    let invoker = EvalInvoker {
        ctx: RefCell::new(ctx),
        handle,
        stages: single,
        reinvoke: Reinvoke::Value(input.clone()),
    };
    let mut engine = PipelineEngine::new();
    engine.run(input, &specs, &invoker).await.map_err(EvalError::from)
}

fn build_specs(stages: &[PipelineStage]) -> Vec<StageSpec> {
    stages
        .iter()
        .map(|stage| StageSpec::new(stage.exec_name.clone()).with_args(Vec::new()))
        .collect()
}

/// What `reinvoke_source` does when stage 1 asks for a retry.
enum Reinvoke<'a> {
    /// Re-run the expression that produced the pipe's source value.
    Source(&'a Expr),
    /// The value was already computed by the caller (condensed-pipe
    /// sites); it can only be "re-produced" by cloning it back, and only
    /// when it was marked retryable to begin with.
    Value(Value),
}

struct EvalInvoker<'a> {
    ctx: RefCell<&'a mut EvalContext>,
    handle: EnvHandle,
    stages: &'a [PipelineStage],
    reinvoke: Reinvoke<'a>,
}

#[async_trait::async_trait(?Send)]
impl<'a> StageInvoker for EvalInvoker<'a> {
    async fn invoke_transformer(
        &self,
        stage_index: usize,
        spec: &StageSpec,
        input: &Value,
        stage_ctx: &StageContext,
        pipeline: &PipelineVars,
    ) -> Result<StageResult, EvalError> {
        let stage = &self.stages[stage_index - 1];
        let mut ctx = self.ctx.borrow_mut();

        // `input` is whatever the previous stage produced verbatim — when that
        // stage was a format-aware transformer (`exec.rs::wrap_transformer_result`),
        // it's already a `Structured{text, data_type, data}` value, so `@input`
        // is format-aware here too without this site doing anything extra.
        let scope = ctx.arena.child(self.handle, EnvKind::PipelineScope);
        ctx.arena.install_reserved(scope, "ctx", ReservedValue::Static(stage_ctx.to_value()));
        ctx.arena.install_reserved(scope, "pipeline", ReservedValue::Static(pipeline.to_value()));
        ctx.arena.install_reserved(scope, "input", ReservedValue::Static(input.clone()));

        let mut extra_args = Vec::with_capacity(stage.args.len());
        for arg in &stage.args {
            match crate::expr::eval_expr(&mut ctx, scope, arg).await {
                Ok(value) => extra_args.push(value),
                Err(err) => {
                    ctx.arena.destroy(scope);
                    return Err(err);
                }
            }
        }

        let lookup = ctx.arena.get(scope, &spec.exec_name);
        let exec = match lookup {
            Some(value) => match value.kind {
                ValueKind::Executable(exec) => exec,
                _ => {
                    ctx.arena.destroy(scope);
                    return Err(mlld_errors::VariableError::FieldNotFound {
                        name: spec.exec_name.clone(),
                        field: "(not callable)".to_string(),
                    }
                    .into());
                }
            },
            None => {
                ctx.arena.destroy(scope);
                return Err(mlld_errors::VariableError::UndefinedVariable { name: spec.exec_name.clone() }.into());
            }
        };

        let args = bind_stage_args(&exec, input, &extra_args);
        let result = crate::exec::call_executable(&mut ctx, scope, exec, args).await;
        ctx.arena.destroy(scope);
        let result = result?;

        Ok(classify(result))
    }

    async fn reinvoke_source(&self) -> Result<Value, EvalError> {
        match &self.reinvoke {
            Reinvoke::Source(expr) => {
                let mut ctx = self.ctx.borrow_mut();
                crate::expr::eval_expr(&mut ctx, self.handle, expr).await
            }
            Reinvoke::Value(value) => Ok(value.clone()),
        }
    }
}

/// Bind a stage's input into the executable's parameters (§4.6
/// "multi-parameter transformer binding"): with no extra positional args
/// and more than one parameter, destructure a JSON-object input by key
/// match; otherwise bind the input to the first parameter and default the
/// rest to empty string, then append any extra args written after the
/// stage name.
fn bind_stage_args(exec: &Executable, input: &Value, extra: &[Value]) -> Vec<Value> {
    if extra.is_empty() && exec.params.len() > 1 {
        if let ValueKind::Object(fields) = &input.kind {
            return exec
                .params
                .iter()
                .map(|param| fields.get(param).cloned().unwrap_or_else(|| Value::string("")))
                .collect();
        }
        let mut args = vec![input.clone()];
        args.resize_with(exec.params.len(), || Value::string(""));
        return args;
    }
    let mut args = vec![input.clone()];
    args.extend(extra.iter().cloned());
    args
}

/// A stage body asks for the previous stage to be re-run by returning the
/// string `"retry"` or an object carrying a truthy `retry` field; anything
/// else is the stage's completed output.
fn classify(value: Value) -> StageResult {
    if requests_retry(&value) {
        StageResult::RetryUpstream
    } else {
        StageResult::Complete(value)
    }
}

fn requests_retry(value: &Value) -> bool {
    match &value.kind {
        ValueKind::Str(s) => s == "retry",
        ValueKind::Object(fields) => fields.get("retry").map(Value::is_truthy).unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlld_ast::ExecBody;

    #[test]
    fn bind_stage_args_destructures_object_input_by_param_name() {
        let exec = Executable::new(
            "merge".to_string(),
            vec!["a".to_string(), "b".to_string()],
            ExecBody::Template(mlld_ast::Template {
                kind: mlld_ast::TemplateKind::DoubleQuote,
                parts: vec![],
            }),
        );
        let mut fields = indexmap::IndexMap::new();
        fields.insert("a".to_string(), Value::string("x"));
        let input = Value::object(fields);
        let args = bind_stage_args(&exec, &input, &[]);
        assert_eq!(args[0], Value::string("x"));
        assert_eq!(args[1], Value::string(""));
    }

    #[test]
    fn bind_stage_args_defaults_single_param_to_raw_input() {
        let exec = Executable::new(
            "upper".to_string(),
            vec!["x".to_string()],
            ExecBody::Template(mlld_ast::Template {
                kind: mlld_ast::TemplateKind::DoubleQuote,
                parts: vec![],
            }),
        );
        let input = Value::string("hi");
        let args = bind_stage_args(&exec, &input, &[]);
        assert_eq!(args, vec![Value::string("hi")]);
    }

    #[test]
    fn requests_retry_matches_bare_string_and_object_flag() {
        assert!(requests_retry(&Value::string("retry")));
        assert!(!requests_retry(&Value::string("retry me")));
        let mut fields = indexmap::IndexMap::new();
        fields.insert("retry".to_string(), Value::boolean(true));
        assert!(requests_retry(&Value::object(fields)));
    }
}
