//! Lazily-evaluated, memoized cells (§9 re-architecture guidance): derived
//! `LoadContent` fields (`tokens`, `fm`, `json`) are thunks forced on first
//! access. Re-entry while `Evaluating` is `LazyCycle` (fatal), not silently
//! re-run.

use mlld_errors::{EvalError, VariableError};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

enum LazyState<T> {
    Unevaluated(Rc<dyn Fn() -> Result<T, String>>),
    Evaluating,
    Ready(T),
    Failed(String),
}

/// A memoized thunk. Cloning shares the same underlying cell, matching the
/// spec's "forced on first access; memoized" semantics for any clone of a
/// value carrying this field.
pub struct LazyField<T> {
    state: Rc<RefCell<LazyState<T>>>,
    name: &'static str,
}

impl<T: Clone> LazyField<T> {
    pub fn new(name: &'static str, thunk: impl Fn() -> Result<T, String> + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(LazyState::Unevaluated(Rc::new(thunk)))),
            name,
        }
    }

    pub fn ready(name: &'static str, value: T) -> Self {
        Self {
            state: Rc::new(RefCell::new(LazyState::Ready(value))),
            name,
        }
    }

    /// Force evaluation, memoizing the result. Returns `LazyCycle` if this
    /// field is re-entered while already evaluating.
    pub fn force(&self) -> Result<T, EvalError> {
        let thunk = {
            let mut state = self.state.borrow_mut();
            match &*state {
                LazyState::Ready(v) => return Ok(v.clone()),
                LazyState::Failed(msg) => {
                    return Err(EvalError::Variable(VariableError::LazyCycle {
                        name: format!("{}: {msg}", self.name),
                    }));
                }
                LazyState::Evaluating => {
                    return Err(EvalError::Variable(VariableError::LazyCycle {
                        name: self.name.to_string(),
                    }));
                }
                LazyState::Unevaluated(thunk) => {
                    let thunk = thunk.clone();
                    *state = LazyState::Evaluating;
                    thunk
                }
            }
        };

        match thunk() {
            Ok(value) => {
                *self.state.borrow_mut() = LazyState::Ready(value.clone());
                Ok(value)
            }
            Err(msg) => {
                *self.state.borrow_mut() = LazyState::Failed(msg.clone());
                Err(EvalError::Variable(VariableError::LazyCycle {
                    name: format!("{}: {msg}", self.name),
                }))
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.state.borrow(), LazyState::Ready(_))
    }
}

impl<T> Clone for LazyField<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            name: self.name,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LazyField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            LazyState::Unevaluated(_) => write!(f, "LazyField({})::Unevaluated", self.name),
            LazyState::Evaluating => write!(f, "LazyField({})::Evaluating", self.name),
            LazyState::Ready(v) => write!(f, "LazyField({})::Ready({v:?})", self.name),
            LazyState::Failed(e) => write!(f, "LazyField({})::Failed({e})", self.name),
        }
    }
}

impl<T: Clone + PartialEq> PartialEq for LazyField<T> {
    /// Compares the currently observed snapshot. Two unevaluated (or
    /// evaluating) lazy fields compare equal without forcing either — value
    /// equality only distinguishes already-memoized results.
    fn eq(&self, other: &Self) -> bool {
        match (&*self.state.borrow(), &*other.state.borrow()) {
            (LazyState::Ready(a), LazyState::Ready(b)) => a == b,
            (LazyState::Unevaluated(_), LazyState::Unevaluated(_)) => true,
            (LazyState::Evaluating, LazyState::Evaluating) => true,
            (LazyState::Failed(a), LazyState::Failed(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn force_memoizes_result() {
        let calls = Rc::new(Cell::new(0));
        let calls2 = Rc::clone(&calls);
        let field = LazyField::new("tokens", move || {
            calls2.set(calls2.get() + 1);
            Ok::<_, String>(42u64)
        });
        assert_eq!(field.force().unwrap(), 42);
        assert_eq!(field.force().unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn clone_shares_memoized_state() {
        let field = LazyField::new("json", || Ok::<_, String>(1));
        let clone = field.clone();
        assert_eq!(field.force().unwrap(), 1);
        assert!(clone.is_ready());
    }

    #[test]
    fn reentry_while_evaluating_is_lazy_cycle() {
        // Simulate re-entry by manually driving the state machine: a thunk
        // that calls force() on itself would deadlock on a real mutex, but
        // with a RefCell it panics on re-borrow; we instead assert the
        // documented contract by directly constructing the Evaluating state.
        let field: LazyField<u64> = LazyField {
            state: Rc::new(RefCell::new(LazyState::Evaluating)),
            name: "fm",
        };
        let err = field.force().unwrap_err();
        assert!(err.to_string().contains("fm"));
    }
}
