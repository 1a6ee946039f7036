//! Environment-variable configuration (§6.3 "Environment-variable
//! recognition"), centralized the way the teacher's `cli/src/env.rs` and
//! `daemon/src/env.rs` read every `OJ_*` var in one place rather than
//! scattering `std::env::var` calls through the binary. One function per
//! variable, folded into `mlld_eval::InterpreterConfig` plus the handful of
//! settings the core itself has no opinion about (project root, registry
//! base URL, lock file path, color).

use mlld_ast::BlockAction;
use mlld_eval::InterpreterConfig;
use mlld_policy::GuardAfterTiming;
use std::path::PathBuf;

/// Ambient host configuration, read once at process start and threaded
/// through rather than re-read per call (§9 "no process-wide state" —
/// this struct *is* the per-invocation state, not a global).
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub interpreter: InterpreterConfig,
    pub guard_after: GuardAfterTiming,
    pub project_root: PathBuf,
    pub registry_base_url: String,
    pub lock_path: PathBuf,
    pub use_color: bool,
}

impl HostConfig {
    /// Reads every `MLLD_*` variable this crate recognizes, falling back to
    /// the project's conventional defaults. Never panics on a missing or
    /// malformed variable — a bad value just falls back silently, the same
    /// tolerance `cli/src/env.rs`'s `parse_duration_ms` applies.
    pub fn from_env() -> Self {
        let project_root = env_path("MLLD_PROJECT_ROOT", ".");
        Self {
            interpreter: InterpreterConfig {
                approve_all_imports: env_bool("MLLD_APPROVE_ALL_IMPORTS", false),
                force_refresh: env_bool("MLLD_FORCE_REFRESH", false),
                default_timeout_secs: env_u64("MLLD_TIMEOUT_SECS", 30),
                block_action: env_block_action("MLLD_WHEN_ANY_COLLECT"),
            },
            guard_after: env_guard_after("MLLD_GUARD_AFTER"),
            lock_path: env_path("MLLD_LOCK_PATH", "mlld.lock.json"),
            registry_base_url: env_string(
                "MLLD_REGISTRY_URL",
                "https://registry.mlld.dev",
            ),
            use_color: should_use_color(),
            project_root,
        }
    }
}

fn env_string(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

fn env_bool(var: &str, default: bool) -> bool {
    match std::env::var(var) {
        Ok(raw) => matches!(raw.trim(), "1" | "true" | "TRUE" | "yes"),
        Err(_) => default,
    }
}

fn env_u64(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn env_block_action(var: &str) -> BlockAction {
    match std::env::var(var).ok().as_deref() {
        Some("first") => BlockAction::First,
        Some("last") => BlockAction::Last,
        _ => BlockAction::All,
    }
}

fn env_guard_after(var: &str) -> GuardAfterTiming {
    match std::env::var(var).ok().as_deref() {
        Some("every-attempt") => GuardAfterTiming::EveryAttempt,
        _ => GuardAfterTiming::FinalOnly,
    }
}

/// `NODE_DISABLE_COLORS` (§6.3) takes priority over `NO_COLOR`/`MLLD_COLOR`
/// the way the teacher's `cli/src/env.rs::no_color`/`force_color` resolve a
/// chain of color-related env vars rather than trusting a single one.
fn should_use_color() -> bool {
    if std::env::var("NODE_DISABLE_COLORS").is_ok() {
        return false;
    }
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if env_bool("MLLD_COLOR", false) {
        return true;
    }
    true
}
