//! Typed error taxonomy for the interpreter core.
//!
//! Mirrors `oj_engine::error::RuntimeError`'s shape: one `thiserror` enum per
//! subsystem, nested under a single top-level error via `#[from]`, so a
//! `?` anywhere in the core bubbles up to one type without manual wrapping.

use crate::span::{Frame, SourceSpan};
use thiserror::Error;

/// Errors raised while looking up or binding names in an environment.
#[derive(Debug, Error)]
pub enum VariableError {
    #[error("undefined variable: @{name}")]
    UndefinedVariable { name: String },
    #[error("field not found: @{name}.{field}")]
    FieldNotFound { name: String, field: String },
    #[error("cannot rebind @{name}: already bound in this scope")]
    ImmutableRebinding { name: String },
    #[error("@{name} is a reserved name and cannot be rebound")]
    ReservedName { name: String },
    #[error("lazy value @{name} was re-entered while still evaluating")]
    LazyCycle { name: String },
    #[error("cannot iterate over {kind}")]
    NotIterable { kind: String },
}

/// Errors raised by the resolver/import layer.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("file not found: {path}")]
    FileNotFound { path: String },
    #[error("circular import: {}", chain.join(" -> "))]
    CircularImport { chain: Vec<String> },
    #[error("import collision: @{name} is already bound")]
    ImportCollision { name: String },
    #[error("integrity mismatch for {reference}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        reference: String,
        expected: String,
        actual: String,
    },
    #[error("no resolver can handle reference: {reference}")]
    ResolverUnavailable { reference: String },
    #[error("import depth exceeded 20 levels while resolving {reference}")]
    MaxDepthExceeded { reference: String },
    #[error("the same file was imported more than 3 times in one chain: {reference}")]
    MaxSameFileExceeded { reference: String },
    #[error("dynamic module exceeds injection limits: {reason}")]
    DynamicModuleTooLarge { reason: String },
}

/// Errors raised while running shell/shadow command bodies.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    #[error("command timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Errors raised by the pipeline engine.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage {stage} cannot retry itself")]
    SelfRetryForbidden { stage: usize },
    #[error("source value is not retryable (not produced by a call expression)")]
    NonRetryableSource,
    #[error("retry limit exceeded: {scope}")]
    RetryLimitExceeded { scope: String },
    #[error("stage {stage} failed: {cause}")]
    StageError {
        stage: usize,
        #[source]
        cause: Box<EvalError>,
    },
}

/// Errors raised by guard/policy evaluation.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("operation '{operation}' denied by label '{label}'")]
    PolicyDenial { label: String, operation: String },
    #[error("taint violation: value labeled for '{from}' flowed into '{to}'")]
    TaintViolation { from: String, to: String },
}

/// Errors from directive validation (static shape checks before execution).
#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("validation failed: {message}")]
    ValidationFailed { message: String },
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

/// System-level errors: abort signals and I/O failures.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("aborted")]
    Aborted,
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The union of every subsystem error, without location information.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Variable(#[from] VariableError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Directive(#[from] DirectiveError),
    #[error(transparent)]
    System(#[from] SystemError),
}

impl EvalError {
    /// Process exit code per the SDK entry point contract (§6.3):
    /// 0 success, 1 fatal error, 2 policy denial, 3 import failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            EvalError::Policy(_) => 2,
            EvalError::Import(_) => 3,
            _ => 1,
        }
    }
}

/// A fully located, chained interpreter error: what the top-level entry
/// point returns and what `render::bordered_box` prints.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct InterpreterError {
    #[source]
    pub kind: EvalError,
    pub location: Option<SourceSpan>,
    pub frames: Vec<Frame>,
}

impl InterpreterError {
    pub fn new(kind: impl Into<EvalError>) -> Self {
        Self {
            kind: kind.into(),
            location: None,
            frames: Vec::new(),
        }
    }

    pub fn at(mut self, location: SourceSpan) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl From<EvalError> for InterpreterError {
    fn from(kind: EvalError) -> Self {
        Self::new(kind)
    }
}

impl From<VariableError> for InterpreterError {
    fn from(e: VariableError) -> Self {
        Self::new(EvalError::from(e))
    }
}

impl From<ImportError> for InterpreterError {
    fn from(e: ImportError) -> Self {
        Self::new(EvalError::from(e))
    }
}

impl From<CommandError> for InterpreterError {
    fn from(e: CommandError) -> Self {
        Self::new(EvalError::from(e))
    }
}

impl From<PipelineError> for InterpreterError {
    fn from(e: PipelineError) -> Self {
        Self::new(EvalError::from(e))
    }
}

impl From<PolicyError> for InterpreterError {
    fn from(e: PolicyError) -> Self {
        Self::new(EvalError::from(e))
    }
}

impl From<DirectiveError> for InterpreterError {
    fn from(e: DirectiveError) -> Self {
        Self::new(EvalError::from(e))
    }
}

impl From<SystemError> for InterpreterError {
    fn from(e: SystemError) -> Self {
        Self::new(EvalError::from(e))
    }
}

pub type EvalResult<T> = Result<T, EvalError>;
pub type InterpResult<T> = Result<T, InterpreterError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
