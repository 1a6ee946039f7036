//! Environment kinds (§3.2).

/// What flavor of scope an environment slot represents. Affects how `get`
/// augments reserved slots and how `merge`/`capture` treat it, not whether
/// `set` succeeds (that's governed purely by local-binding presence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    /// The program's top-level environment. No parent.
    Root,
    /// Inherits from a parent; used by `when`/`for`/block actions.
    Child,
    /// A read-only snapshot captured at export time (§3.2 "captured-module").
    CapturedModule,
    /// Augments a child with `@ctx`, `@pipeline`, `@input`, `@try`.
    PipelineScope,
    /// Adds MCP tools within an `/env` block.
    EnvScope,
}
