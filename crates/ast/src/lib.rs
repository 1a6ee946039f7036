// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! AST node definitions consumed by the mlld interpreter core.
//!
//! This crate models the *contract* between the (out-of-scope) surface
//! parser and the interpreter: plain data types with no behavior beyond
//! small constructors. Nothing here parses mlld source text.

mod directive;
mod expr;
mod path_context;
mod program;

pub use directive::{
    Directive, DirectiveKind, ExecBody, GuardTiming, ImportForm, ImportMode, Lang, OutputFormat,
    OutputTarget, Param, StreamKind,
};
pub use expr::{
    BlockAction, BlockStmt, Expr, FieldStep, FileLoad, FileLoadKind, Literal, PipelineStage,
    Template, TemplateKind, TemplatePart, WhenArm, WhenForm, WhenModifier,
};
pub use path_context::PathContext;
pub use program::Program;
