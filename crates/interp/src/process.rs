//! The SDK entry point (§6.3): constructs a root environment, installs
//! every resolver/shadow/policy registry the teacher's own daemon wires up
//! at startup (`daemon/src/env.rs`-style "build once per run"), then drives
//! a parsed program through `mlld_eval::eval_directive` directive by
//! directive.

use mlld_ast::{OutputFormat, PathContext, Program};
use mlld_effects::{EffectSink, InMemorySink};
use mlld_env::EnvArena;
use mlld_errors::InterpreterError;
use mlld_eval::{
    install_root_reserved, register_default_transformers, Bookkeeping, EvalContext,
    InterpreterConfig, NoParser, ProgramParser,
};
use mlld_policy::{GuardRegistry, PolicyConfig};
use mlld_resolver::{
    serialize_dynamic_module, BuiltinResolver, Cache, DynamicResolver, FileSystem,
    HttpResolver, KeychainResolver, LocalResolver, LockFile, ProjectResolver,
    RealFileSystem, RegistryResolver, ResolverRegistry,
};
use mlld_shadow::{NodeExecutor, PythonExecutor, ShadowRegistry, ShellExecutor};
use mlld_value::ModuleSnapshot;
use serde_json::Value as JsonValue;
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::HostConfig;
use crate::events::{ChannelSink, InterpEvent};

/// A dynamic module value (§4.5 "Dynamic modules", §6.3 `dynamicModules`):
/// either a plain JSON object the core serializes into `/var` declarations
/// (§4.5's size/depth limits apply), or source text already in that shape.
#[derive(Debug, Clone)]
pub enum DynamicModule {
    Source(String),
    Json(JsonValue),
}

/// Process exit codes per §6.3/§7: "0 success; 1 fatal error; 2 policy
/// denial; 3 import failure", modeled as a convertible enum rather than a
/// bare `i32` so the out-of-scope CLI collaborator can match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Fatal = 1,
    PolicyDenial = 2,
    ImportFailure = 3,
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        match code {
            0 => ExitCode::Success,
            2 => ExitCode::PolicyDenial,
            3 => ExitCode::ImportFailure,
            _ => ExitCode::Fatal,
        }
    }
}

/// Everything `processMlld`'s options bag (§6.3) carries, plus the
/// env-derived `host` config the distilled spec leaves implicit.
pub struct ProcessOptions {
    pub file_path: String,
    pub path_context: Option<PathContext>,
    pub format: OutputFormat,
    pub normalize_blank_lines: bool,
    pub approve_all_imports: Option<bool>,
    pub capture_environment: Option<Box<dyn FnOnce(ModuleSnapshot)>>,
    pub dynamic_modules: Vec<(String, DynamicModule)>,
    /// Present only for the streaming variant (§6.3): when set, every
    /// effect is additionally forwarded over this channel as it happens.
    pub events: Option<UnboundedSender<InterpEvent>>,
    /// The (out-of-scope) parser collaborator, needed only by
    /// [`process_mlld`] and by `/import` when the program imports other
    /// mlld source. Defaults to [`NoParser`] when absent.
    pub parser: Option<Rc<dyn ProgramParser>>,
    pub host: HostConfig,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            file_path: "main.mld".to_string(),
            path_context: None,
            format: OutputFormat::Text,
            normalize_blank_lines: true,
            approve_all_imports: None,
            capture_environment: None,
            dynamic_modules: Vec::new(),
            events: None,
            parser: None,
            host: HostConfig::from_env(),
        }
    }
}

/// What `processMlld` resolves to (§6.3): `Promise<string | StructuredResult>`
/// becomes one struct carrying both, since Rust has no ad hoc union return.
pub struct ProcessOutput {
    pub text: String,
    pub structured: Option<JsonValue>,
    pub exit_code: ExitCode,
    pub bookkeeping: Bookkeeping,
}

/// Parse `source` via `options.parser` (falling back to [`NoParser`], which
/// fails informatively rather than silently producing an empty program) and
/// evaluate it. The primary entry point for callers whose AST is already
/// in hand is [`process_program`]; this is the convenience wrapper that
/// additionally does the parsing step (still not performed by this crate
/// itself — it only invokes the collaborator).
pub async fn process_mlld(source: &str, options: ProcessOptions) -> Result<ProcessOutput, InterpreterError> {
    let parser = options
        .parser
        .clone()
        .unwrap_or_else(|| Rc::new(NoParser) as Rc<dyn ProgramParser>);
    let program = parser.parse(source, &options.file_path)?;
    process_program(&program, options).await
}

/// Evaluate an already-parsed program end to end: build the environment
/// and every registry, run each top-level directive through the directive
/// evaluator in order, then shape the result per `options.format`.
pub async fn process_program(program: &Program, options: ProcessOptions) -> Result<ProcessOutput, InterpreterError> {
    tracing::info!(file = %options.file_path, directives = program.directives.len(), "processing program");

    let mut arena = EnvArena::new();
    let root = arena.root();

    let path_context = options.path_context.clone().unwrap_or_else(|| {
        PathContext::single(options.host.project_root.clone())
    });

    install_root_reserved(&mut arena, root, &path_context);
    register_default_transformers(&mut arena, root).map_err(InterpreterError::from)?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem::new());

    let mut resolvers = ResolverRegistry::new();
    resolvers.register(Box::new(ProjectResolver::new(
        fs.clone(),
        path_context.project_root.to_string_lossy().into_owned(),
    )));
    resolvers.register(Box::new(LocalResolver::new(fs.clone())));
    resolvers.register(Box::new(HttpResolver::new(reqwest::Client::new())));
    resolvers.register(Box::new(RegistryResolver::new(
        reqwest::Client::new(),
        options.host.registry_base_url.clone(),
    )));
    resolvers.register(Box::new(KeychainResolver::new()));
    resolvers.register(Box::new(BuiltinResolver::new()));

    // No McpResolver is registered: real MCP tool registration reads its
    // config from a configured exec's return value, which is explicitly
    // out of scope (§1 non-goals). An `mcp:` reference still classifies
    // (see `Reference::normalize`'s `KNOWN_RESOLVER_PREFIXES`) but fails
    // with `ResolverUnavailable` at dispatch, the same as any other
    // reference no installed resolver claims.
    let mut dynamic = DynamicResolver::new();
    for (name, module) in &options.dynamic_modules {
        let source = match module {
            DynamicModule::Source(raw) => raw.clone(),
            DynamicModule::Json(json) => serialize_dynamic_module(json)?,
        };
        dynamic.register(name.clone(), source);
    }
    resolvers.register(Box::new(dynamic));

    let mut shadow = ShadowRegistry::new();
    shadow.install(Box::new(NodeExecutor::new()));
    shadow.install(Box::new(NodeExecutor::js()));
    shadow.install(Box::new(PythonExecutor::new()));
    shadow.install(Box::new(ShellExecutor::new()));

    let mut interpreter_config: InterpreterConfig = options.host.interpreter.clone();
    if let Some(approve) = options.approve_all_imports {
        interpreter_config.approve_all_imports = approve;
    }

    let lock = LockFile::load(&options.host.lock_path)?;
    let parser: Rc<dyn ProgramParser> = options
        .parser
        .clone()
        .unwrap_or_else(|| Rc::new(NoParser) as Rc<dyn ProgramParser>);

    let base_sink = InMemorySink::new();
    let sink: Box<dyn EffectSink> = match &options.events {
        Some(sender) => Box::new(ChannelSink::new(base_sink, sender.clone())),
        None => Box::new(base_sink),
    };

    let mut ctx = EvalContext::new(
        arena,
        root,
        resolvers,
        GuardRegistry::new(),
        PolicyConfig::new(),
        shadow,
        parser,
        interpreter_config,
        sink,
        path_context,
        fs,
        Cache::new(),
        lock,
        Some(options.host.lock_path.clone()),
    );

    let result = run_directives(&mut ctx, root, program).await;

    if let Some(sender) = &options.events {
        let exit_code = result.as_ref().err().map(|e: &InterpreterError| e.exit_code()).unwrap_or(0);
        let _ = sender.send(InterpEvent::Completed { exit_code });
    }

    result?;

    if let Some(path) = ctx.lock_path.clone() {
        ctx.lock.save(&path).map_err(InterpreterError::from)?;
    }

    if let Some(capture) = options.capture_environment {
        capture(ctx.arena.capture(root));
    }

    let raw_text = ctx.sink.rendered_text().unwrap_or_default();
    let text = if options.normalize_blank_lines {
        normalize_blank_lines(&raw_text)
    } else {
        raw_text
    };

    let bookkeeping = ctx.bookkeeping.clone();
    shape_output(&mut ctx, root, text, options.format, bookkeeping).await
}

async fn run_directives(
    ctx: &mut EvalContext,
    root: mlld_env::EnvHandle,
    program: &Program,
) -> Result<(), InterpreterError> {
    for directive in &program.directives {
        tracing::debug!(location = %directive.location, "evaluating directive");
        mlld_eval::eval_directive(ctx, root, directive)
            .await
            .map_err(|err| InterpreterError::from(err).at(directive.location.clone()))?;
    }
    Ok(())
}

/// Collapses the final rendered text per `format` (§6.3): `markdown`/`text`
/// pass through as-is (beyond blank-line normalization, applied by the
/// caller), `json`/`xml` run the output through the matching built-in
/// transformer and additionally populate `structured`.
async fn shape_output(
    ctx: &mut EvalContext,
    root: mlld_env::EnvHandle,
    text: String,
    format: OutputFormat,
    bookkeeping: Bookkeeping,
) -> Result<ProcessOutput, InterpreterError> {
    let transformer_name = match format {
        OutputFormat::Json => Some("json"),
        OutputFormat::Xml => Some("xml"),
        OutputFormat::Csv => Some("csv"),
        OutputFormat::Md | OutputFormat::Text | OutputFormat::Binary => None,
    };

    let Some(name) = transformer_name else {
        return Ok(ProcessOutput {
            text,
            structured: None,
            exit_code: ExitCode::Success,
            bookkeeping,
        });
    };

    let transformed = mlld_eval::call_executable_by_name(ctx, root, name, vec![mlld_value::Value::string(text.clone())])
        .await
        .map_err(InterpreterError::from)?;

    Ok(ProcessOutput {
        text: transformed.coerce_to_string(),
        structured: Some(transformed.to_json()),
        exit_code: ExitCode::Success,
        bookkeeping,
    })
}

/// Collapses 3+ consecutive newlines to 2 (§6.3 `normalizeBlankLines`), the
/// one text-shaping knob the distilled spec names explicitly.
fn normalize_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newline_run = 0;
    for ch in text.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push(ch);
            }
        } else {
            newline_run = 0;
            out.push(ch);
        }
    }
    out
}
