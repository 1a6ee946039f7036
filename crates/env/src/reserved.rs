//! Reserved name slots (§3.2): built-ins that cannot be rebound and whose
//! value may be computed fresh at read time (`now`) rather than stored.

use mlld_value::Value;
use std::rc::Rc;

/// The fixed set of reserved names. Checked before ordinary bindings on
/// every `get`, and rejected unconditionally by `set`.
pub const RESERVED_NAMES: &[&str] = &[
    "now", "base", "root", "debug", "input", "mx", "fm", "ctx", "pipeline",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// A reserved slot's value, either fixed for the environment's lifetime
/// (`base`, `fm`) or recomputed on every read (`now`).
#[derive(Clone)]
pub enum ReservedValue {
    Static(Value),
    Dynamic(Rc<dyn Fn() -> Value>),
}

impl ReservedValue {
    pub fn resolve(&self) -> Value {
        match self {
            ReservedValue::Static(v) => v.clone(),
            ReservedValue::Dynamic(f) => f(),
        }
    }
}

impl std::fmt::Debug for ReservedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservedValue::Static(v) => write!(f, "ReservedValue::Static({v:?})"),
            ReservedValue::Dynamic(_) => write!(f, "ReservedValue::Dynamic(..)"),
        }
    }
}
