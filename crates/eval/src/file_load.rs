//! File/URL/glob load evaluation (§3.1, §4.2 "File references"): the four
//! `<...>` forms share a load step, then each applies its own condensed
//! pipes and `as` clause.

use crate::context::EvalContext;
use crate::future::BoxFuture;
use mlld_ast::{FileLoad, FileLoadKind};
use mlld_env::{EnvHandle, ReservedValue};
use mlld_errors::{EvalError, ImportError, SystemError, VariableError};
use mlld_resolver::{ContextKind, Reference};
use mlld_value::{LoadContent, LoadContentArray, Source, Value, ValueKind, ValueMeta};
use std::path::Path;
use std::rc::Rc;

pub fn eval_file_load<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    file_load: &'a FileLoad,
) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(async move {
        let mut value = load(ctx, handle, file_load).await?;
        for stage in &file_load.pipes {
            value = crate::pipeline_invoker::run_condensed_stage(ctx, handle, stage, value).await?;
        }
        Ok(value)
    })
}

async fn load(ctx: &mut EvalContext, handle: EnvHandle, file_load: &FileLoad) -> Result<Value, EvalError> {
    match &file_load.kind {
        FileLoadKind::Path => {
            let raw = crate::expr::eval_expr_to_string(ctx, handle, &file_load.reference).await?;
            load_path(ctx, &raw)
        }
        FileLoadKind::Url => {
            let raw = crate::expr::eval_expr_to_string(ctx, handle, &file_load.reference).await?;
            load_url(ctx, &raw).await
        }
        FileLoadKind::Glob => {
            let raw = crate::expr::eval_expr_to_string(ctx, handle, &file_load.reference).await?;
            load_glob(ctx, handle, &raw, file_load.as_clause.as_deref()).await
        }
        FileLoadKind::Section { heading } => {
            let raw = crate::expr::eval_expr_to_string(ctx, handle, &file_load.reference).await?;
            let loaded = load_path(ctx, &raw)?;
            let content = loaded.coerce_to_string();
            Ok(Value::string(extract_section(&content, heading)))
        }
        FileLoadKind::CurrentFilePlaceholder => ctx
            .arena
            .get(handle, "mx")
            .ok_or_else(|| VariableError::UndefinedVariable { name: "mx".to_string() }.into()),
    }
}

fn load_path(ctx: &EvalContext, raw: &str) -> Result<Value, EvalError> {
    let reference = Reference::normalize(raw, &ctx.paths);
    let canonical = reference.canonical();
    let content = ctx
        .fs
        .read_to_string(Path::new(&canonical))
        .map_err(|_| ImportError::FileNotFound { path: canonical.clone() })?;
    let filename = reference.basename();
    let load_content = LoadContent::from_file(content, filename, canonical.clone());
    Ok(Value::new(
        ValueKind::LoadContent(Rc::new(load_content)),
        ValueMeta::literal(EvalContext::now_ms()).with_source(Source::File(canonical)),
    ))
}

async fn load_url(ctx: &EvalContext, raw: &str) -> Result<Value, EvalError> {
    let reference = Reference::normalize(raw, &ctx.paths);
    let fetched = ctx.resolvers.dispatch(&reference, ContextKind::Path).await?;
    let mut load_content = LoadContent::from_file(fetched.content, reference.basename(), reference.canonical());
    load_content.url = Some(reference.canonical());
    load_content.content_type = fetched.content_type;
    Ok(Value::new(
        ValueKind::LoadContent(Rc::new(load_content)),
        ValueMeta::literal(EvalContext::now_ms()).with_source(Source::Url(reference.canonical())),
    ))
}

async fn load_glob(
    ctx: &mut EvalContext,
    handle: EnvHandle,
    pattern: &str,
    as_clause: Option<&mlld_ast::Expr>,
) -> Result<Value, EvalError> {
    let reference = Reference::normalize(pattern, &ctx.paths);
    let paths = ctx
        .fs
        .glob(&reference.canonical())
        .map_err(|e| SystemError::IoError(e))?;

    let mut items = Vec::with_capacity(paths.len());
    for path in &paths {
        let content = ctx
            .fs
            .read_to_string(path)
            .map_err(|e| SystemError::IoError(e))?;
        let filename = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        items.push(LoadContent::from_file(content, filename, path.to_string_lossy().to_string()));
    }

    // `as "..."` with the `<>` placeholder (§4.2): key each matched file's
    // content by its rendered label instead of returning a bare array.
    if let Some(label_expr) = as_clause {
        let mut object = indexmap::IndexMap::new();
        for item in items {
            let item_value = Value::new(
                ValueKind::LoadContent(Rc::new(item)),
                ValueMeta::literal(EvalContext::now_ms()),
            );
            ctx.arena.install_reserved(handle, "mx", ReservedValue::Static(item_value.clone()));
            let label = crate::expr::eval_expr_to_string(ctx, handle, label_expr).await?;
            object.insert(label, item_value);
        }
        return Ok(Value::object(object));
    }

    Ok(Value::new(
        ValueKind::LoadContentArray(Rc::new(LoadContentArray::new(reference.canonical(), items))),
        ValueMeta::literal(EvalContext::now_ms()),
    ))
}

/// Extract the body of a markdown section under `heading` (§4.2 `<path #
/// section>`): from the first line whose trimmed, `#`-stripped text
/// matches `heading` up to (not including) the next heading of equal or
/// shallower depth, or end of file.
fn extract_section(content: &str, heading: &str) -> String {
    let mut lines = content.lines();
    let mut depth = None;
    let mut start_found = false;
    let mut out = Vec::new();

    for line in &mut lines {
        let trimmed_level = line.chars().take_while(|c| *c == '#').count();
        if trimmed_level > 0 {
            let text = line[trimmed_level..].trim();
            if text == heading.trim() {
                depth = Some(trimmed_level);
                start_found = true;
                continue;
            }
        }
        if start_found {
            if trimmed_level > 0 && trimmed_level <= depth.unwrap_or(usize::MAX) {
                break;
            }
            out.push(line);
        }
    }
    out.join("\n").trim().to_string()
}

/// Shared by `exec.rs`'s `SectionExtract` body: `path_value` is whatever the
/// body's path expression evaluated to, coerced to a path string.
pub async fn load_section_from_value(ctx: &mut EvalContext, path_value: &Value, section: &str) -> Result<Value, EvalError> {
    let raw = path_value.coerce_to_string();
    let loaded = load_path(ctx, &raw)?;
    Ok(Value::string(extract_section(&loaded.coerce_to_string(), section)))
}

/// Shared by `exec.rs`'s `ResolverPath` body (`/exe ... = resolver:path`):
/// dispatch a raw resolver reference string directly, bypassing the
/// `FileLoad` AST shape entirely.
pub async fn load_reference_path(ctx: &mut EvalContext, reference: &str) -> Result<Value, EvalError> {
    load_url(ctx, reference).await
}
