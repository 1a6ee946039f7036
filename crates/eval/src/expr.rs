//! The expression evaluator (§4.3): dispatches every `Expr` variant to its
//! dedicated handler, recursing back through here wherever a sub-form
//! nests another expression.

use crate::context::EvalContext;
use crate::future::BoxFuture;
use mlld_ast::{Expr, FieldStep, Literal};
use mlld_env::EnvHandle;
use mlld_errors::{EvalError, VariableError};
use mlld_value::{Value, ValueKind};

/// Evaluate `expr` against `handle`. Mutually recursive with
/// `when.rs`/`for_loop.rs`/`file_load.rs`/`pipeline_invoker.rs`/`exec.rs`,
/// so every entry point returns a boxed future (§9 re-architecture note:
/// Rust has no recursive `async fn`).
pub fn eval_expr<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    expr: &'a Expr,
) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(async move {
        match expr {
            Expr::Literal(lit) => eval_literal(ctx, handle, lit).await,
            Expr::VarRef { name, path } => eval_var_ref(ctx, handle, name, path),
            Expr::Interpolated(template) => {
                let text = crate::template::render_template(ctx, handle, template).await?;
                Ok(Value::string(text))
            }
            Expr::ExecInvocation { name, args } => {
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(eval_expr(ctx, handle, arg).await?);
                }
                crate::exec::call_executable_by_name(ctx, handle, name, evaluated).await
            }
            Expr::Pipe { source, stages } => {
                crate::pipeline_invoker::run_pipe(ctx, handle, source, stages).await
            }
            Expr::When(form) => crate::when::eval_when(ctx, handle, form).await,
            Expr::For(spec) => crate::for_loop::eval_for(ctx, handle, spec).await,
            Expr::FileLoad(file_load) => crate::file_load::eval_file_load(ctx, handle, file_load).await,
            Expr::Block(stmts) => crate::when::eval_block(ctx, handle, stmts).await,
            Expr::Not(inner) => {
                let value = eval_expr(ctx, handle, inner).await?;
                Ok(Value::boolean(!value.is_truthy()))
            }
        }
    })
}

fn eval_literal<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    lit: &'a Literal,
) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(async move {
        let kind = match lit {
            Literal::Str(s) => ValueKind::Str(s.clone()),
            Literal::Number(n) => ValueKind::Number(*n),
            Literal::Bool(b) => ValueKind::Bool(*b),
            Literal::Null => ValueKind::Null,
            Literal::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(eval_expr(ctx, handle, item).await?);
                }
                ValueKind::Array(out)
            }
            Literal::Object(fields) => {
                let mut out = indexmap::IndexMap::new();
                for (key, value_expr) in fields {
                    out.insert(key.clone(), eval_expr(ctx, handle, value_expr).await?);
                }
                ValueKind::Object(out)
            }
        };
        Ok(Value::literal(kind, EvalContext::now_ms()))
    })
}

/// `@name.a.0.b`-style reference resolution (§4.3). Reserved slots and
/// ordinary bindings share `get`; a bare `@name` whose value is a `Lazy`
/// thunk is forced here so callers never have to special-case it.
fn eval_var_ref(ctx: &EvalContext, handle: EnvHandle, name: &str, path: &[FieldStep]) -> Result<Value, EvalError> {
    let mut value = ctx
        .arena
        .get(handle, name)
        .ok_or_else(|| VariableError::UndefinedVariable { name: name.to_string() })?;
    value = force_if_lazy(value)?;
    for step in path {
        value = match step {
            FieldStep::Name(key) => value.get_field(key).ok_or_else(|| VariableError::FieldNotFound {
                name: name.to_string(),
                field: key.clone(),
            })?,
            FieldStep::Index(index) => value.get_index(*index).ok_or_else(|| VariableError::FieldNotFound {
                name: name.to_string(),
                field: index.to_string(),
            })?,
        };
        value = force_if_lazy(value)?;
    }
    Ok(value)
}

fn force_if_lazy(value: Value) -> Result<Value, EvalError> {
    match value.kind {
        ValueKind::Lazy(thunk) => {
            let mut forced = thunk.force()?;
            forced.meta.absorb_labels(&value.meta);
            Ok(forced)
        }
        _ => Ok(value),
    }
}

/// Truthiness used by `when` conditions (§4.2.1): a missing field inside a
/// condition is falsy rather than `FieldNotFound`, unlike ordinary
/// interpolation lookups.
pub fn eval_condition<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    expr: &'a Expr,
) -> BoxFuture<'a, Result<bool, EvalError>> {
    Box::pin(async move {
        match expr {
            Expr::VarRef { name, path } => {
                let Some(mut value) = ctx.arena.get(handle, name) else {
                    return Ok(false);
                };
                value = force_if_lazy(value)?;
                for step in path {
                    let next = match step {
                        FieldStep::Name(key) => value.get_field(key),
                        FieldStep::Index(index) => value.get_index(*index),
                    };
                    match next {
                        Some(v) => value = force_if_lazy(v)?,
                        None => return Ok(false),
                    }
                }
                Ok(value.is_truthy())
            }
            other => Ok(eval_expr(ctx, handle, other).await?.is_truthy()),
        }
    })
}

/// Helper for sites (pipeline condensed stages, `as` clauses) that need a
/// plain `Rc`-free string out of an evaluated expression.
pub async fn eval_expr_to_string<'a>(ctx: &'a mut EvalContext, handle: EnvHandle, expr: &'a Expr) -> Result<String, EvalError> {
    Ok(eval_expr(ctx, handle, expr).await?.coerce_to_string())
}
