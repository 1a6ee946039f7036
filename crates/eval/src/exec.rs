//! Executable invocation (§4.4): dispatches every `ExecBody` variant,
//! applies label policy around the call, and marshals parameters into
//! shadow-language bodies.

use crate::context::EvalContext;
use crate::future::BoxFuture;
use mlld_ast::{ExecBody, GuardTiming};
use mlld_env::{EnvHandle, EnvKind};
use mlld_errors::{EvalError, PolicyError, VariableError};
use mlld_policy::{Guard, GuardVerdict};
use mlld_shadow::{bind_params, ExecRequest};
use mlld_value::{Executable, Structured, Value, ValueKind};
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

/// Look `name` up in `handle`'s scope chain and call it. The common path
/// for `@name(args)` call expressions and condensed pipe stages whose spec
/// only carries a name.
pub fn call_executable_by_name<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    name: &'a str,
    args: Vec<Value>,
) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(async move {
        let value = ctx
            .arena
            .get(handle, name)
            .ok_or_else(|| VariableError::UndefinedVariable { name: name.to_string() })?;
        let exec = match value.kind {
            mlld_value::ValueKind::Executable(exec) => exec,
            _ => {
                return Err(VariableError::FieldNotFound {
                    name: name.to_string(),
                    field: "(not callable)".to_string(),
                }
                .into())
            }
        };
        call_executable(ctx, handle, exec, args).await
    })
}

/// Invoke `exec` with `args` already evaluated. `handle` is the caller's
/// scope, used only to resolve shadow-env helpers and as the parent for a
/// fresh per-call child scope; the captured module environment (if any) is
/// bound into that scope first, so a parameter sharing a captured name
/// isn't an override — it's a second `set` of an already-bound name, which
/// raises `ImmutableRebinding` (the `exe-parameter-shadowing` anti-pattern).
pub fn call_executable<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    exec: Rc<Executable>,
    args: Vec<Value>,
) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(async move {
        ctx.policy.check(&exec.labels, "op:exec")?;

        let operations = guarded_operations(&exec.labels);
        check_guards(ctx, handle, &operations, GuardTiming::Before).await?;

        let call_scope = ctx.arena.child(handle, EnvKind::Child);
        if let Some(snapshot) = &exec.captured_env {
            for (name, value) in &snapshot.bindings {
                ctx.arena.set(call_scope, name, value.clone())?;
            }
        }
        for (param, value) in exec.params.iter().zip(args.iter().cloned().chain(std::iter::repeat(Value::null()))) {
            ctx.arena.set(call_scope, param, value)?;
        }

        let result = run_body(ctx, call_scope, &exec, &args).await;
        ctx.arena.destroy(call_scope);

        let mut result = result?;
        if exec.labels.iter().any(|label| label == "builtin-transformer") {
            result = wrap_transformer_result(&exec.name, result);
        }
        result.meta.retryable = true;
        result.absorb_labels_from(args.iter());
        mlld_policy::apply_untrusted_llm_rule(&exec.labels, &mut result.meta);

        check_guards(ctx, handle, &operations, GuardTiming::After).await?;
        Ok(result)
    })
}

/// A format-aware transformer body (§4.6) returns `{text, data}` rather than
/// a bare value; lift that into the `Structured` wrapper so a later pipe
/// stage's `@input` carries both forms instead of just the rendered text
/// (§3.1 "Structured ... carrying both textual and parsed representations").
/// A transformer body that didn't return the `{text, data}` shape (a custom
/// exec carrying the label by mistake, say) passes through unchanged.
fn wrap_transformer_result(name: &str, mut value: Value) -> Value {
    if let ValueKind::Object(fields) = &value.kind {
        if let (Some(text), Some(data)) = (fields.get("text"), fields.get("data")) {
            value.kind = ValueKind::Structured(Box::new(Structured {
                text: text.coerce_to_string(),
                data_type: name.to_string(),
                data: Box::new(data.clone()),
            }));
        }
    }
    value
}

/// Every operation label a guard might be registered against for this call:
/// the generic `op:exec` operation plus the executable's own labels (§4.7
/// treats a guard's `OPERATION` as matching any label carried by the call).
fn guarded_operations(labels: &[String]) -> BTreeSet<String> {
    let mut ops: BTreeSet<String> = labels.iter().cloned().collect();
    ops.insert("op:exec".to_string());
    ops
}

/// Evaluate every guard registered for `operations`/`timing` in `handle`'s
/// scope, in registration order; the first `deny` aborts with
/// `PolicyError::PolicyDenial` (§4.7: "on deny, the operation is aborted").
async fn check_guards(
    ctx: &mut EvalContext,
    handle: EnvHandle,
    operations: &BTreeSet<String>,
    timing: GuardTiming,
) -> Result<(), EvalError> {
    for operation in operations {
        let guards: Vec<Guard> = ctx.guards.matching(operation, timing).into_iter().cloned().collect();
        for guard in guards {
            let verdict = crate::when::eval_when(ctx, handle, &guard.when_expr).await?;
            if let GuardVerdict::Deny(_) = guard_verdict(&verdict) {
                return Err(PolicyError::PolicyDenial {
                    label: guard.name.clone(),
                    operation: operation.clone(),
                }
                .into());
            }
        }
    }
    Ok(())
}

/// A guard's `when` action resolves to `"allow"` or `"deny"`/`"deny: msg"`
/// (§4.7); anything else — including the `when` falling through with no
/// matching arm, which evaluates to `null` — is treated as `allow`.
fn guard_verdict(value: &Value) -> GuardVerdict {
    let text = value.coerce_to_string();
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("deny") {
        GuardVerdict::Deny(rest.trim_start_matches(':').trim().to_string())
    } else {
        GuardVerdict::Allow
    }
}

async fn run_body(ctx: &mut EvalContext, call_scope: EnvHandle, exec: &Executable, args: &[Value]) -> Result<Value, EvalError> {
    match &exec.body {
        ExecBody::Template(template) => {
            let text = crate::template::render_template(ctx, call_scope, template).await?;
            Ok(Value::string(text))
        }
        ExecBody::Command(template) => {
            let command = crate::template::render_template(ctx, call_scope, template).await?;
            run_shell(ctx, &command).await
        }
        ExecBody::Code { lang, body } => run_shadow(ctx, call_scope, *lang, body, &exec.params, args).await,
        ExecBody::SectionExtract { path, section } => {
            let rendered = crate::expr::eval_expr(ctx, call_scope, path).await?;
            crate::file_load::load_section_from_value(ctx, &rendered, section).await
        }
        ExecBody::ResolverPath { reference } => crate::file_load::load_reference_path(ctx, reference).await,
    }
}

async fn run_shell(ctx: &mut EvalContext, command: &str) -> Result<Value, EvalError> {
    let timeout = Duration::from_secs(ctx.config.default_timeout_secs);
    let request = ExecRequest::new(mlld_ast::Lang::Sh, command, Vec::new(), timeout);
    let value = ctx.shadow.run(&request).await?;
    Ok(value)
}

async fn run_shadow(
    ctx: &mut EvalContext,
    call_scope: EnvHandle,
    lang: mlld_ast::Lang,
    body: &str,
    params: &[String],
    args: &[Value],
) -> Result<Value, EvalError> {
    let timeout = Duration::from_secs(ctx.config.default_timeout_secs);
    let helpers = ctx.shadow_helpers(call_scope, lang);
    let bound = bind_params(params, args);
    let request = ExecRequest::new(lang, body, bound, timeout).with_helpers(helpers);
    let value = ctx.shadow.run(&request).await?;
    Ok(value)
}
