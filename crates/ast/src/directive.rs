//! Directive node definitions — one variant per slash-directive kind
//! (§4.2).

use crate::expr::{BlockStmt, Expr, Template, WhenForm};
use mlld_errors::SourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
}

/// The language an `/exe ... = LANG { ... }` code body runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    Js,
    Node,
    Python,
    Sh,
}

/// An executable's body (§4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum ExecBody {
    Template(Template),
    Command(Template),
    Code { lang: Lang, body: String },
    SectionExtract { path: Box<Expr>, section: String },
    ResolverPath { reference: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Md,
    Xml,
    Csv,
    Text,
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    File(Expr),
    Stream(StreamKind),
}

/// `/import module|static|live|cached(TTL)|local { ... }` mode (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Module,
    Static,
    Live,
    Cached { ttl_secs: u64 },
    Local,
}

impl Default for ImportMode {
    fn default() -> Self {
        ImportMode::Module
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportForm {
    /// `import { @a, @b } from SRC`
    Selected {
        names: Vec<String>,
        source: Expr,
        mode: ImportMode,
    },
    /// `import SRC as @ns`
    Namespaced {
        source: Expr,
        namespace: String,
        mode: ImportMode,
    },
    /// `import SRC` — filename-derived namespace.
    Bare { source: Expr, mode: ImportMode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardTiming {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveKind {
    Var {
        name: String,
        expr: Expr,
    },
    Exe {
        name: String,
        params: Vec<Param>,
        body: ExecBody,
        labels: Vec<String>,
    },
    Path {
        name: String,
        expr: Expr,
    },
    Show {
        expr: Expr,
    },
    Run {
        expr: Expr,
    },
    Output {
        expr: Expr,
        target: OutputTarget,
        format: Option<OutputFormat>,
    },
    When {
        form: WhenForm,
    },
    For {
        spec: crate::expr::ForSpec,
    },
    Import {
        form: ImportForm,
    },
    Export {
        names: Vec<String>,
    },
    Guard {
        name: String,
        timing: GuardTiming,
        operation: String,
        when_expr: WhenForm,
    },
    Env {
        config_name: Option<String>,
        body: Vec<BlockStmt>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub location: SourceSpan,
}

impl Directive {
    pub fn new(kind: DirectiveKind, location: SourceSpan) -> Self {
        Self { kind, location }
    }
}
