//! Guard registration (§4.7): a named pre/post check on labeled operations.
//! The `when` condition/action themselves are plain `mlld_ast` data; running
//! them is `mlld_eval`'s job (it owns the environment and expression
//! evaluator). This crate only stores the registry and records the verdict.

use mlld_ast::WhenForm;

pub use mlld_ast::GuardTiming;

/// A registered guard: `guard @name before/after OPERATION = when [...]`.
#[derive(Debug, Clone)]
pub struct Guard {
    pub name: String,
    pub timing: GuardTiming,
    pub operation: String,
    pub when_expr: WhenForm,
}

impl Guard {
    pub fn new(
        name: impl Into<String>,
        timing: GuardTiming,
        operation: impl Into<String>,
        when_expr: WhenForm,
    ) -> Self {
        Self {
            name: name.into(),
            timing,
            operation: operation.into(),
            when_expr,
        }
    }
}

/// The outcome of evaluating a guard's `when` body: `deny "msg"` aborts the
/// guarded operation with `PolicyDenial`; `allow` (or no guard firing)
/// permits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    Allow,
    Deny(String),
}

/// All guards registered in one interpreter invocation, queryable by
/// operation label and timing.
#[derive(Debug, Clone, Default)]
pub struct GuardRegistry {
    guards: Vec<Guard>,
}

impl GuardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, guard: Guard) {
        self.guards.push(guard);
    }

    /// Guards matching `operation` and `timing`, in registration order.
    pub fn matching(&self, operation: &str, timing: GuardTiming) -> Vec<&Guard> {
        self.guards
            .iter()
            .filter(|g| g.operation == operation && g.timing == timing)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlld_ast::Expr;

    fn simple_guard(timing: GuardTiming, operation: &str) -> Guard {
        Guard::new(
            "g",
            timing,
            operation,
            WhenForm::Simple {
                condition: Box::new(Expr::boolean(true)),
                action: Box::new(Expr::str("deny")),
            },
        )
    }

    #[test]
    fn matching_filters_by_operation_and_timing() {
        let mut registry = GuardRegistry::new();
        registry.register(simple_guard(GuardTiming::Before, "secret"));
        registry.register(simple_guard(GuardTiming::After, "secret"));
        registry.register(simple_guard(GuardTiming::Before, "op:show"));

        let before_secret = registry.matching("secret", GuardTiming::Before);
        assert_eq!(before_secret.len(), 1);
        let after_secret = registry.matching("secret", GuardTiming::After);
        assert_eq!(after_secret.len(), 1);
    }

    #[test]
    fn unmatched_operation_returns_empty() {
        let registry = GuardRegistry::new();
        assert!(registry.matching("secret", GuardTiming::Before).is_empty());
    }
}
