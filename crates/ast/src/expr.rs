//! Expression node definitions — the shape of the RHS forms the directive
//! evaluator in `mlld_eval` consumes (§4.3).

use indexmap::IndexMap;
use mlld_errors::SourceSpan;

/// A literal value as written in source (before evaluation produces an
/// `mlld_value::Value`).
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Number(f64),
    Bool(bool),
    Null,
    Array(Vec<Expr>),
    Object(IndexMap<String, Expr>),
}

/// One step in a field-access path: `.a` is `Name`, `.0` is `Index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStep {
    Name(String),
    Index(usize),
}

/// The four template delimiter forms (§4.2.3), carried on `Template` so the
/// evaluator can apply the right interpolation/newline rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// `"..."` — `@var` interpolation, single line.
    DoubleQuote,
    /// `` `...` `` — `@var` interpolation, multi-line.
    Backtick,
    /// `:::...:::` — `{{var}}` interpolation only, multi-line.
    TripleColon,
    /// `::...::` — `@var` interpolation, multi-line.
    DoubleColon,
}

impl TemplateKind {
    pub fn allows_multiline(self) -> bool {
        !matches!(self, TemplateKind::DoubleQuote)
    }

    pub fn uses_mustache(self) -> bool {
        matches!(self, TemplateKind::TripleColon)
    }
}

/// A reference to an executable to run as a pipeline stage transformer.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStage {
    pub exec_name: String,
    pub args: Vec<Expr>,
    pub location: SourceSpan,
}

/// What kind of content a `<...>` file reference loads.
#[derive(Debug, Clone, PartialEq)]
pub enum FileLoadKind {
    Path,
    Url,
    Glob,
    Section { heading: String },
    /// `<>` inside an `as "..."` clause: refers to the current file in a
    /// glob iteration.
    CurrentFilePlaceholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileLoad {
    /// The path/url/glob text, itself interpolable.
    pub reference: Box<Expr>,
    pub kind: FileLoadKind,
    /// Condensed pipe syntax: `<file.json>|@json|@xml`.
    pub pipes: Vec<PipelineStage>,
    /// Trailing `as "..."` clause, if present. Per DESIGN.md's resolution of
    /// open question 2, this wraps the whole piped expression.
    pub as_clause: Option<Box<Expr>>,
}

/// One segment of an interpolated template body.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    /// `@var` or `@var.field.0` reference, with any condensed pipes applied
    /// inline (e.g. inside `"...@var|@upper..."`).
    Var {
        name: String,
        path: Vec<FieldStep>,
        pipes: Vec<PipelineStage>,
    },
    /// `{{var}}` reference, only valid inside `:::...:::` templates.
    Mustache { name: String },
    FileRef(FileLoad),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub kind: TemplateKind,
    pub parts: Vec<TemplatePart>,
}

/// `when` block modifier (§4.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenModifier {
    First,
    All,
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhenArm {
    pub condition: Expr,
    pub action: Expr,
    /// `*=>` default arm; condition is ignored (always matches) when true.
    pub is_default: bool,
    pub location: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WhenForm {
    /// `when COND => ACTION`
    Simple {
        condition: Box<Expr>,
        action: Box<Expr>,
    },
    /// `when MODIFIER [ C1 => A1; ...; *=> DEFAULT ]`
    Block {
        modifier: WhenModifier,
        arms: Vec<WhenArm>,
    },
}

/// How `when any`'s matched action values are combined into one result.
/// Resolves Open Question 1 (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockAction {
    First,
    Last,
    #[default]
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForSpec {
    pub item: String,
    pub key: Option<String>,
    pub collection: Box<Expr>,
    /// `parallel(N)`, if present.
    pub parallel: Option<u32>,
    pub body: Vec<BlockStmt>,
}

/// A statement inside a `when`/`for`/`env` block body. `Let` is block-scoped
/// and ephemeral (disappears at block exit); `Directive` is a full
/// directive, re-dispatched through the directive evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockStmt {
    Let {
        name: String,
        expr: Expr,
        location: SourceSpan,
    },
    Directive(crate::directive::Directive),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    VarRef {
        name: String,
        path: Vec<FieldStep>,
    },
    Interpolated(Template),
    ExecInvocation {
        name: String,
        args: Vec<Expr>,
    },
    Pipe {
        source: Box<Expr>,
        stages: Vec<PipelineStage>,
    },
    When(WhenForm),
    For(ForSpec),
    FileLoad(FileLoad),
    /// A sequence of block statements evaluated for their last-produced
    /// value (used as the body of `when`/`for` actions that need more than
    /// one statement).
    Block(Vec<BlockStmt>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn str(s: impl Into<String>) -> Self {
        Expr::Literal(Literal::Str(s.into()))
    }

    pub fn number(n: f64) -> Self {
        Expr::Literal(Literal::Number(n))
    }

    pub fn boolean(b: bool) -> Self {
        Expr::Literal(Literal::Bool(b))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::VarRef {
            name: name.into(),
            path: Vec::new(),
        }
    }

    pub fn field(name: impl Into<String>, path: Vec<FieldStep>) -> Self {
        Expr::VarRef {
            name: name.into(),
            path,
        }
    }
}
