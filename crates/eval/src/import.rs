//! `/import` evaluation (§4.5): normalizes the reference, checks the import
//! stack for cycles, probes the cache, dispatches to the resolver chain,
//! verifies lock-file integrity, recursively parses and evaluates the
//! fetched module, then merges its exports into the importing scope.

use crate::context::EvalContext;
use crate::future::BoxFuture;
use mlld_ast::{ImportForm, ImportMode, PathContext};
use mlld_env::{EnvHandle, EnvKind, ReservedValue};
use mlld_errors::{EvalError, ImportError};
use mlld_resolver::{CacheKey, ContextKind, Reference};
use mlld_value::{LoadContent, Value};
use std::time::Duration;

pub fn eval_import<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    form: &'a ImportForm,
) -> BoxFuture<'a, Result<(), EvalError>> {
    Box::pin(async move {
        let (source_expr, mode) = source_and_mode(form);
        let raw = crate::expr::eval_expr_to_string(ctx, handle, source_expr).await?;
        let reference = Reference::normalize(&raw, &ctx.paths);
        let canonical = reference.canonical();
        let basename = reference.basename();

        ctx.import_stack.push(&canonical, &basename)?;
        let result = run_import(ctx, handle, form, &reference, mode).await;
        ctx.import_stack.pop();
        result
    })
}

fn source_and_mode(form: &ImportForm) -> (&mlld_ast::Expr, ImportMode) {
    match form {
        ImportForm::Selected { source, mode, .. } => (source, *mode),
        ImportForm::Namespaced { source, mode, .. } => (source, *mode),
        ImportForm::Bare { source, mode } => (source, *mode),
    }
}

async fn run_import(
    ctx: &mut EvalContext,
    handle: EnvHandle,
    form: &ImportForm,
    reference: &Reference,
    mode: ImportMode,
) -> Result<(), EvalError> {
    let canonical = reference.canonical();
    let tag = resolver_tag(reference);
    let cache_key = CacheKey::new(tag, canonical.clone(), None);

    let (content, content_hash) = if mode != ImportMode::Live {
        if let Some((content, _content_type, hash)) = ctx.cache.get(&cache_key, EvalContext::now_ms()) {
            (content.to_string(), hash.to_string())
        } else {
            fetch_and_cache(ctx, reference, &cache_key, mode).await?
        }
    } else {
        fetch_and_cache(ctx, reference, &cache_key, mode).await?
    };

    verify_lock_pin(ctx, &canonical, &content_hash)?;
    maybe_pin_lock(ctx, reference, &content_hash);

    let module_value = parse_and_evaluate(ctx, &canonical, &content).await?;
    bind_into_scope(ctx, handle, form, reference, module_value)
}

/// Fetch via the resolver chain, insert the result into the cache (so a
/// second import of the same reference within this invocation is a cache
/// hit even outside the lock-pinned TTL window), and return `(content,
/// content_hash)`.
async fn fetch_and_cache(
    ctx: &mut EvalContext,
    reference: &Reference,
    cache_key: &CacheKey,
    mode: ImportMode,
) -> Result<(String, String), EvalError> {
    if let ImportMode::Cached { ttl_secs } = mode {
        ctx.cache.set_ttl(cache_key.resolver.clone(), Duration::from_secs(ttl_secs));
    }
    let fetched = ctx.resolvers.dispatch(reference, ContextKind::Import).await?;
    let hash = mlld_resolver::content_hash(&fetched.content);
    ctx.cache.insert(
        cache_key.clone(),
        fetched.content.clone(),
        fetched.content_type.clone(),
        hash.clone(),
        EvalContext::now_ms(),
    );
    Ok((fetched.content, hash))
}

/// §4.5 step 6: a lock-pinned registry/URL import must match its recorded
/// hash unless a refresh was requested.
fn verify_lock_pin(ctx: &EvalContext, canonical: &str, actual_hash: &str) -> Result<(), EvalError> {
    match ctx.lock.get(canonical) {
        Some(entry) if ctx.config.force_refresh || entry.resolved == actual_hash => Ok(()),
        Some(entry) => Err(ImportError::IntegrityMismatch {
            reference: canonical.to_string(),
            expected: entry.resolved.clone(),
            actual: actual_hash.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}

/// §4.5 step 9: pin a registry/URL import's first successful fetch. Other
/// reference kinds (local paths, dynamic modules, resolver-prefixed) aren't
/// lock-pinned.
fn maybe_pin_lock(ctx: &mut EvalContext, reference: &Reference, content_hash: &str) {
    let name = match reference {
        Reference::Registry { author, name } => format!("@{author}/{name}"),
        Reference::Url(url) => url.clone(),
        _ => return,
    };
    if ctx.lock.get(&name).is_some() {
        return;
    }
    ctx.lock.pin(
        name.clone(),
        mlld_resolver::LockEntry {
            version: "0.0.0".to_string(),
            resolved: content_hash.to_string(),
            source: name.clone(),
            source_url: reference.canonical(),
            integrity: content_hash.to_string(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
            registry_version: "0.0.0".to_string(),
        },
    );
    if let Some(path) = &ctx.lock_path {
        let _ = ctx.lock.save(path);
    }
}

/// §4.5 step 7: parse the fetched content and run the interpreter on it in
/// a fresh child scope with its own file context, returning that scope's
/// bindings as an object keyed by exported name (plus the full set under
/// `__all__` isn't needed — callers read `exported_names`/`get` directly).
async fn parse_and_evaluate(ctx: &mut EvalContext, canonical: &str, content: &str) -> Result<EnvHandle, EvalError> {
    let program = ctx.parser.parse(content, canonical)?;

    let saved_paths = ctx.paths.clone();
    ctx.paths = PathContext::new(
        saved_paths.project_root.clone(),
        parent_dir(canonical),
        saved_paths.invocation_dir.clone(),
    );

    let module_scope = ctx.arena.child(ctx.root, EnvKind::Child);
    let load_content = LoadContent::from_file(content.to_string(), basename_of(canonical), canonical.to_string());
    let fm_value = load_content.fm.force().unwrap_or_else(|_| Value::null());
    ctx.arena.install_reserved(module_scope, "fm", ReservedValue::Static(fm_value));

    let mut outcome = Ok(());
    for directive in &program.directives {
        if let Err(err) = crate::directive::eval_directive(ctx, module_scope, directive).await {
            outcome = Err(err);
            break;
        }
    }

    ctx.paths = saved_paths;
    match outcome {
        Ok(()) => Ok(module_scope),
        Err(err) => {
            ctx.arena.destroy(module_scope);
            Err(err)
        }
    }
}

fn parent_dir(canonical: &str) -> String {
    match canonical.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => ".".to_string(),
    }
}

fn basename_of(canonical: &str) -> String {
    canonical.rsplit('/').next().unwrap_or(canonical).to_string()
}

/// §4.5 step 8: consult the module scope's export manifest (explicit
/// `/export` list, else every non-underscore top-level name) and merge the
/// selected/namespaced bindings into the importing scope.
fn bind_into_scope(
    ctx: &mut EvalContext,
    handle: EnvHandle,
    form: &ImportForm,
    reference: &Reference,
    module_scope: EnvHandle,
) -> Result<(), EvalError> {
    let exported = ctx.arena.exported_names(module_scope);

    match form {
        ImportForm::Selected { names, .. } => {
            for name in names {
                if !exported.contains(name) {
                    ctx.arena.destroy(module_scope);
                    return Err(ImportError::FileNotFound {
                        path: format!("export @{name} not found in imported module"),
                    }
                    .into());
                }
                let Some(value) = ctx.arena.get(module_scope, name) else {
                    ctx.arena.destroy(module_scope);
                    return Err(ImportError::FileNotFound {
                        path: format!("export @{name} not found in imported module"),
                    }
                    .into());
                };
                if let Err(_err) = ctx.arena.set(handle, name, value) {
                    ctx.arena.destroy(module_scope);
                    return Err(ImportError::ImportCollision { name: name.clone() }.into());
                }
                ctx.bookkeeping.imports.push(name.clone());
            }
        }
        ImportForm::Namespaced { namespace, .. } => {
            let mut fields = indexmap::IndexMap::new();
            for name in &exported {
                if let Some(value) = ctx.arena.get(module_scope, name) {
                    fields.insert(name.clone(), value);
                }
            }
            if let Err(_err) = ctx.arena.set(handle, namespace, Value::object(fields)) {
                ctx.arena.destroy(module_scope);
                return Err(ImportError::ImportCollision { name: namespace.clone() }.into());
            }
            ctx.bookkeeping.imports.push(namespace.clone());
        }
        ImportForm::Bare { .. } => {
            let namespace = filename_namespace(reference);
            let mut fields = indexmap::IndexMap::new();
            for name in &exported {
                if let Some(value) = ctx.arena.get(module_scope, name) {
                    fields.insert(name.clone(), value);
                }
            }
            if let Err(_err) = ctx.arena.set(handle, &namespace, Value::object(fields)) {
                ctx.arena.destroy(module_scope);
                return Err(ImportError::ImportCollision { name: namespace.clone() }.into());
            }
            ctx.bookkeeping.imports.push(namespace);
        }
    }
    ctx.arena.destroy(module_scope);
    Ok(())
}

/// Derive the filename-based namespace for a bare `import SRC` (§4.5): the
/// basename without its extension, e.g. `./lib/utils.mld` imports as
/// `@utils`.
fn filename_namespace(reference: &Reference) -> String {
    let base = reference.basename();
    match base.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
        _ => base,
    }
}

fn resolver_tag(reference: &Reference) -> &'static str {
    match reference {
        Reference::AbsolutePath(_) => "local",
        Reference::RelativePath(_) => "local",
        Reference::Url(_) => "http",
        Reference::Registry { .. } => "registry",
        Reference::ResolverPrefixed { resolver, .. } => match resolver.as_str() {
            "keychain" => "keychain",
            "mcp" => "mcp",
            other => {
                let _ = other;
                "resolver"
            }
        },
    }
}
