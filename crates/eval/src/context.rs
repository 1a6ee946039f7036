//! The evaluator's working state: the environment arena, the resolver and
//! shadow registries, policy/guard registries, the effect sink, and the
//! bookkeeping the validator report is built from.

use mlld_ast::{BlockAction, Lang, PathContext, Program};
use mlld_effects::{Effect, EffectSink};
use mlld_env::{EnvArena, EnvHandle};
use mlld_errors::ImportError;
use mlld_policy::{GuardRegistry, PolicyConfig};
use mlld_resolver::{Cache, FileSystem, ImportStack, LockFile, ResolverRegistry};
use mlld_shadow::ShadowRegistry;
use mlld_value::Executable;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

/// Parsing is out of scope for the interpreter core (§1); a collaborator
/// supplies it so `/import` can turn fetched text back into a `Program`.
pub trait ProgramParser {
    fn parse(&self, source: &str, file_path: &str) -> Result<Program, ImportError>;
}

/// A parser that refuses to parse anything — the default for callers that
/// never import, and for tests exercising everything but `/import`.
pub struct NoParser;

impl ProgramParser for NoParser {
    fn parse(&self, _source: &str, file_path: &str) -> Result<Program, ImportError> {
        Err(ImportError::ResolverUnavailable {
            reference: format!("no parser collaborator configured for {file_path}"),
        })
    }
}

/// Read-only ambient configuration (§1 "Configuration", §6.3 env vars),
/// threaded through without being owned by any one subsystem.
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    pub approve_all_imports: bool,
    pub force_refresh: bool,
    pub default_timeout_secs: u64,
    /// How `when any` narrows its collected results (Open Question 1,
    /// DESIGN.md) — defaults to keeping all of them.
    pub block_action: BlockAction,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            approve_all_imports: false,
            force_refresh: false,
            default_timeout_secs: 30,
            block_action: BlockAction::All,
        }
    }
}

/// Names observed during evaluation, the raw material for
/// `mlld_interp::validate::Report` (§6.5). The core populates this
/// opportunistically; it does not interpret or filter the data.
#[derive(Debug, Default, Clone)]
pub struct Bookkeeping {
    pub executables: Vec<String>,
    pub exports: Vec<String>,
    pub imports: Vec<String>,
    pub guards: Vec<String>,
}

pub struct EvalContext {
    pub arena: EnvArena,
    pub root: EnvHandle,
    pub resolvers: ResolverRegistry,
    pub guards: GuardRegistry,
    pub policy: PolicyConfig,
    pub shadow: ShadowRegistry,
    pub import_stack: ImportStack,
    pub parser: Rc<dyn ProgramParser>,
    pub config: InterpreterConfig,
    pub sink: Box<dyn EffectSink>,
    pub bookkeeping: Bookkeeping,
    /// Project/file/invocation roots (§6.1) — `Reference::normalize` and the
    /// `@base`/`@root` reserved slots both read from this.
    pub paths: PathContext,
    /// Local filesystem access for glob expansion (§4.5 "glob imports");
    /// resolver dispatch owns fetching, this is only for enumerating matches.
    pub fs: Arc<dyn FileSystem>,
    /// Resolver fetch cache (§3.4), consulted before dispatch unless the
    /// import mode is `live` or `--force-refresh` is set.
    pub cache: Cache,
    /// In-memory lock file state (§6.2); `path` is where `/import` persists
    /// it back, `None` when the host hasn't configured one (tests, REPL use).
    pub lock: LockFile,
    pub lock_path: Option<PathBuf>,
    /// Per-language helper functions registered for an environment by
    /// `/exe js = { ... }`-style shadow-env declarations (§4.4), keyed by the
    /// defining scope so nested scopes inherit their ancestors' helpers.
    shadow_envs: HashMap<(EnvHandle, Lang), Vec<(String, Rc<Executable>)>>,
}

impl EvalContext {
    /// Assembles a fresh evaluation context around an already-rooted arena.
    /// The host (`mlld_interp::process`) wires up every registry and hands
    /// them in here rather than this crate reaching into env vars or the
    /// filesystem itself — construction stays a pure function of its inputs.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        arena: EnvArena,
        root: EnvHandle,
        resolvers: ResolverRegistry,
        guards: GuardRegistry,
        policy: PolicyConfig,
        shadow: ShadowRegistry,
        parser: Rc<dyn ProgramParser>,
        config: InterpreterConfig,
        sink: Box<dyn EffectSink>,
        paths: PathContext,
        fs: Arc<dyn FileSystem>,
        cache: Cache,
        lock: LockFile,
        lock_path: Option<PathBuf>,
    ) -> Self {
        Self {
            arena,
            root,
            resolvers,
            guards,
            policy,
            shadow,
            import_stack: ImportStack::default(),
            parser,
            config,
            sink,
            bookkeeping: Bookkeeping::default(),
            paths,
            fs,
            cache,
            lock,
            lock_path,
            shadow_envs: HashMap::new(),
        }
    }

    pub fn emit(&mut self, effect: Effect) {
        self.sink.emit(effect);
    }

    pub fn now_ms() -> u64 {
        // `Utc::now()` is a genuine wall-clock read, not the disallowed
        // `Date.now()`-style nondeterminism this crate avoids elsewhere —
        // it only ever backs the read-only `@now` reserved slot.
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }

    pub fn register_shadow_helper(&mut self, handle: EnvHandle, lang: Lang, name: String, exec: Rc<Executable>) {
        self.shadow_envs.entry((handle, lang)).or_default().push((name, exec));
    }

    /// Helpers visible from `handle` for `lang`: its own registrations plus
    /// every ancestor's, outermost first so a nearer scope's name wins on
    /// collision when the shadow executor builds its helper table.
    pub fn shadow_helpers(&self, handle: EnvHandle, lang: Lang) -> Vec<(String, mlld_value::Executable)> {
        let mut chain = Vec::new();
        let mut current = Some(handle);
        while let Some(h) = current {
            chain.push(h);
            current = self.arena.parent(h);
        }
        let mut out = Vec::new();
        for h in chain.into_iter().rev() {
            if let Some(helpers) = self.shadow_envs.get(&(h, lang)) {
                for (name, exec) in helpers {
                    out.push((name.clone(), (**exec).clone()));
                }
            }
        }
        out
    }
}
