//! Directive dispatch (§4.2): one arm per `DirectiveKind`, each updating the
//! environment and/or emitting effects. Every arm yields `Some(value)` for
//! use by `eval_block`'s "last statement wins" result except the purely
//! environment-mutating ones (`/import`, `/export`, `/guard`), which yield
//! `None` since they have no single meaningful value.

use crate::context::EvalContext;
use crate::future::BoxFuture;
use mlld_ast::{Directive, DirectiveKind, OutputFormat, OutputTarget, StreamKind};
use mlld_effects::{Effect, Stream, WriteFormat};
use mlld_env::{EnvHandle, EnvKind};
use mlld_errors::EvalError;
use mlld_policy::Guard;
use mlld_value::{Executable, Value};
use std::rc::Rc;

pub fn eval_directive<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    directive: &'a Directive,
) -> BoxFuture<'a, Result<Option<Value>, EvalError>> {
    Box::pin(async move {
        match &directive.kind {
            DirectiveKind::Var { name, expr } => {
                let value = crate::expr::eval_expr(ctx, handle, expr).await?;
                ctx.arena.set(handle, name, value.clone())?;
                Ok(Some(value))
            }
            DirectiveKind::Exe { name, params, body, labels } => {
                let captured = Rc::new(ctx.arena.capture(handle));
                let exec = Executable::new(name.clone(), params.iter().map(|p| p.name.clone()).collect(), body.clone())
                    .with_labels(labels.iter().cloned())
                    .with_capture(captured);
                let value = Value::literal(mlld_value::ValueKind::Executable(Rc::new(exec)), EvalContext::now_ms());
                ctx.arena.set(handle, name, value.clone())?;
                ctx.bookkeeping.executables.push(name.clone());
                Ok(Some(value))
            }
            DirectiveKind::Path { name, expr } => {
                let rendered = crate::expr::eval_expr_to_string(ctx, handle, expr).await?;
                let value = Value::string(rendered);
                ctx.arena.set(handle, name, value.clone())?;
                Ok(Some(value))
            }
            DirectiveKind::Show { expr } => {
                let text = crate::expr::eval_expr_to_string(ctx, handle, expr).await?;
                ctx.emit(Effect::Show { text: text.clone() });
                Ok(Some(Value::string(text)))
            }
            DirectiveKind::Run { expr } => {
                let value = crate::expr::eval_expr(ctx, handle, expr).await?;
                ctx.emit(Effect::Stream {
                    stream: Stream::Stdout,
                    text: value.coerce_to_string(),
                });
                Ok(Some(value))
            }
            DirectiveKind::Output { expr, target, format } => {
                let value = crate::expr::eval_expr(ctx, handle, expr).await?;
                match target {
                    OutputTarget::File(path_expr) => {
                        let path = crate::expr::eval_expr_to_string(ctx, handle, path_expr).await?;
                        let bytes = format_bytes(ctx, handle, &value, *format).await?;
                        ctx.emit(Effect::Write {
                            path,
                            bytes,
                            format: format.map(to_write_format),
                        });
                    }
                    OutputTarget::Stream(kind) => {
                        let bytes = format_bytes(ctx, handle, &value, *format).await?;
                        let text = String::from_utf8_lossy(&bytes).into_owned();
                        ctx.emit(Effect::Stream {
                            stream: to_effect_stream(*kind),
                            text,
                        });
                    }
                }
                Ok(Some(value))
            }
            DirectiveKind::When { form } => {
                let value = crate::when::eval_when(ctx, handle, form).await?;
                Ok(Some(value))
            }
            DirectiveKind::For { spec } => {
                let value = crate::for_loop::eval_for(ctx, handle, spec).await?;
                Ok(Some(value))
            }
            DirectiveKind::Import { form } => {
                crate::import::eval_import(ctx, handle, form).await?;
                Ok(None)
            }
            DirectiveKind::Export { names } => {
                ctx.arena.add_exports(handle, names.iter().cloned());
                ctx.bookkeeping.exports.extend(names.iter().cloned());
                Ok(None)
            }
            DirectiveKind::Guard { name, timing, operation, when_expr } => {
                ctx.guards.register(Guard::new(name.clone(), *timing, operation.clone(), when_expr.clone()));
                ctx.bookkeeping.guards.push(name.clone());
                Ok(None)
            }
            DirectiveKind::Env { config_name, body } => {
                let scope = ctx.arena.child(handle, EnvKind::EnvScope);
                if let Some(name) = config_name {
                    // MCP tool registration from the config exec's return value is
                    // out of scope (§1 non-goals); invoking it for side effects
                    // still matters so a config body's labels/guards still apply.
                    crate::exec::call_executable_by_name(ctx, scope, name, Vec::new()).await?;
                }
                let result = crate::when::eval_block(ctx, scope, body).await;
                ctx.arena.destroy(scope);
                Ok(Some(result?))
            }
        }
    })
}

async fn format_bytes(
    ctx: &mut EvalContext,
    handle: EnvHandle,
    value: &Value,
    format: Option<OutputFormat>,
) -> Result<Vec<u8>, EvalError> {
    match format {
        None | Some(OutputFormat::Text) | Some(OutputFormat::Binary) => {
            Ok(value.coerce_to_string().into_bytes())
        }
        Some(other) => {
            let name = match other {
                OutputFormat::Json => "json",
                OutputFormat::Md => "md",
                OutputFormat::Xml => "xml",
                OutputFormat::Csv => "csv",
                OutputFormat::Text | OutputFormat::Binary => unreachable!("handled above"),
            };
            let formatted = crate::exec::call_executable_by_name(ctx, handle, name, vec![value.clone()]).await?;
            Ok(formatted.coerce_to_string().into_bytes())
        }
    }
}

fn to_write_format(format: OutputFormat) -> WriteFormat {
    match format {
        OutputFormat::Json => WriteFormat::Json,
        OutputFormat::Md => WriteFormat::Md,
        OutputFormat::Xml => WriteFormat::Xml,
        OutputFormat::Csv => WriteFormat::Csv,
        OutputFormat::Text => WriteFormat::Text,
        OutputFormat::Binary => WriteFormat::Binary,
    }
}

fn to_effect_stream(kind: StreamKind) -> Stream {
    match kind {
        StreamKind::Stdout => Stream::Stdout,
        StreamKind::Stderr => Stream::Stderr,
    }
}
