//! Template interpolation (§4.2.3): the four delimiter forms share one
//! rendering pass over `TemplatePart`s, differing only in whether `@var` or
//! `{{var}}` syntax was accepted at parse time — by the time a `Template`
//! reaches this crate that choice has already been baked into which
//! `TemplatePart` variant shows up, so rendering itself is uniform.

use crate::context::EvalContext;
use crate::future::BoxFuture;
use mlld_ast::{FieldStep, Template, TemplatePart};
use mlld_env::EnvHandle;
use mlld_errors::{EvalError, VariableError};
use mlld_value::Value;

/// Render every part of `template` against `handle`, concatenating the
/// result. File-load parts and condensed pipes recurse through
/// `crate::expr::eval_expr`/`crate::pipeline_invoker`, so this takes a
/// `BoxFuture` the same as the rest of the mutually recursive evaluator.
pub fn render_template<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    template: &'a Template,
) -> BoxFuture<'a, Result<String, EvalError>> {
    Box::pin(async move {
        let mut out = String::new();
        for part in &template.parts {
            out.push_str(&render_part(ctx, handle, part).await?);
        }
        Ok(out)
    })
}

fn render_part<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    part: &'a TemplatePart,
) -> BoxFuture<'a, Result<String, EvalError>> {
    Box::pin(async move {
        match part {
            TemplatePart::Text(text) => Ok(text.clone()),
            TemplatePart::Var { name, path, pipes } => {
                let mut value = lookup(ctx, handle, name, path)?;
                for stage in pipes {
                    value = crate::pipeline_invoker::run_condensed_stage(ctx, handle, stage, value).await?;
                }
                Ok(value.coerce_to_string())
            }
            TemplatePart::Mustache { name } => {
                let value = lookup(ctx, handle, name, &[])?;
                Ok(value.coerce_to_string())
            }
            TemplatePart::FileRef(file_load) => {
                // `eval_file_load` applies the load's own condensed pipes
                // and `as` clause; nothing left to do here but stringify.
                let value = crate::file_load::eval_file_load(ctx, handle, file_load).await?;
                Ok(value.coerce_to_string())
            }
        }
    })
}

/// Resolve `@name.path...` for interpolation. Missing names/fields outside a
/// `when` condition are `FieldNotFound`/`UndefinedVariable` (§4.3), not
/// silently rendered as empty text.
fn lookup(ctx: &EvalContext, handle: EnvHandle, name: &str, path: &[FieldStep]) -> Result<Value, EvalError> {
    let mut value = ctx
        .arena
        .get(handle, name)
        .ok_or_else(|| VariableError::UndefinedVariable { name: name.to_string() })?;
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
    }
    Ok(value)
}
