//! The tagged runtime value variant (§3.1) and its shared metadata.

use crate::executable::Executable;
use crate::lazy::LazyField;
use crate::load_content::{LoadContent, LoadContentArray};
use crate::meta::ValueMeta;
use indexmap::IndexMap;
use std::rc::Rc;

/// A thunk with a closure over the defining environment, forced on first
/// access and memoized (§3.1 "Lazy"). The closure itself lives in
/// `mlld_eval` (it needs the environment type); this crate only holds the
/// memoization cell and a debug label.
pub type Thunk = LazyField<Value>;

/// A runtime value with its provenance metadata attached.
#[derive(Debug, Clone)]
pub struct Value {
    pub kind: ValueKind,
    pub meta: ValueMeta,
}

/// A pipeline stage's output when the transformer is format-aware: carries
/// both the textual form and whatever structure was parsed from it (§4.6
/// "@input ... wrapped when format-aware").
#[derive(Debug, Clone, PartialEq)]
pub struct Structured {
    pub text: String,
    pub data_type: String,
    pub data: Box<Value>,
}

#[derive(Debug, Clone)]
pub enum ValueKind {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Value>),
    /// Ordered mapping, insertion order, duplicate keys overwrite (§3.1).
    Object(IndexMap<String, Value>),
    LoadContent(Rc<LoadContent>),
    LoadContentArray(Rc<LoadContentArray>),
    Executable(Rc<Executable>),
    Structured(Box<Structured>),
    Lazy(Thunk),
}

impl PartialEq for ValueKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueKind::Null, ValueKind::Null) => true,
            (ValueKind::Bool(a), ValueKind::Bool(b)) => a == b,
            (ValueKind::Number(a), ValueKind::Number(b)) => a == b,
            (ValueKind::Str(a), ValueKind::Str(b)) => a == b,
            (ValueKind::Array(a), ValueKind::Array(b)) => a == b,
            (ValueKind::Object(a), ValueKind::Object(b)) => a == b,
            (ValueKind::LoadContent(a), ValueKind::LoadContent(b)) => a.content == b.content,
            (ValueKind::LoadContentArray(a), ValueKind::LoadContentArray(b)) => {
                a.pattern == b.pattern && a.items.len() == b.items.len()
            }
            (ValueKind::Executable(a), ValueKind::Executable(b)) => a.name == b.name,
            (ValueKind::Structured(a), ValueKind::Structured(b)) => a == b,
            (ValueKind::Lazy(a), ValueKind::Lazy(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Value {
    pub fn new(kind: ValueKind, meta: ValueMeta) -> Self {
        Self { kind, meta }
    }

    /// A literal value with fresh, unlabeled, non-retryable metadata. Most
    /// call sites that build literals from source use this; pipeline/exec
    /// results attach their own metadata instead (see `mlld_eval`).
    pub fn literal(kind: ValueKind, timestamp_ms: u64) -> Self {
        Self::new(kind, ValueMeta::literal(timestamp_ms))
    }

    pub fn null() -> Self {
        Self::literal(ValueKind::Null, 0)
    }

    pub fn boolean(b: bool) -> Self {
        Self::literal(ValueKind::Bool(b), 0)
    }

    pub fn number(n: f64) -> Self {
        Self::literal(ValueKind::Number(n), 0)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::literal(ValueKind::Str(s.into()), 0)
    }

    pub fn array(items: Vec<Value>) -> Self {
        Self::literal(ValueKind::Array(items), 0)
    }

    pub fn object(fields: IndexMap<String, Value>) -> Self {
        Self::literal(ValueKind::Object(fields), 0)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    /// Truthiness per §4.2.1: null/undefined → false; boolean as-is; empty
    /// string → false; legacy strings `"false"`/`"0"` → false; other strings
    /// → true; number 0 → false; empty array/object → false; non-empty →
    /// true. Structured/LoadContent/Executable/Lazy values are truthy only
    /// after reducing to one of the above (callers force `Lazy` first; the
    /// others are always-truthy containers here).
    pub fn is_truthy(&self) -> bool {
        match &self.kind {
            ValueKind::Null => false,
            ValueKind::Bool(b) => *b,
            ValueKind::Number(n) => *n != 0.0,
            ValueKind::Str(s) => !s.is_empty() && s != "false" && s != "0",
            ValueKind::Array(items) => !items.is_empty(),
            ValueKind::Object(fields) => !fields.is_empty(),
            ValueKind::LoadContent(_) => true,
            ValueKind::LoadContentArray(arr) => !arr.items.is_empty(),
            ValueKind::Executable(_) => true,
            ValueKind::Structured(s) => s.data.is_truthy(),
            ValueKind::Lazy(thunk) => thunk
                .force()
                .map(|v| v.is_truthy())
                .unwrap_or(false),
        }
    }

    /// Coerce to the string form used when a value is interpolated into a
    /// template (§3.1: LoadContent "yields `content`" when coerced).
    pub fn coerce_to_string(&self) -> String {
        match &self.kind {
            ValueKind::Null => String::new(),
            ValueKind::Bool(b) => b.to_string(),
            ValueKind::Number(n) => format_number(*n),
            ValueKind::Str(s) => s.clone(),
            ValueKind::Array(_) | ValueKind::Object(_) => {
                serde_json::to_string(&self.to_json()).unwrap_or_default()
            }
            ValueKind::LoadContent(lc) => lc.content.clone(),
            ValueKind::LoadContentArray(arr) => arr
                .items
                .iter()
                .map(|lc| lc.content.clone())
                .collect::<Vec<_>>()
                .join("\n"),
            ValueKind::Executable(exec) => format!("<executable @{}>", exec.name),
            ValueKind::Structured(s) => s.text.clone(),
            ValueKind::Lazy(thunk) => thunk
                .force()
                .map(|v| v.coerce_to_string())
                .unwrap_or_default(),
        }
    }

    /// Field access by name (object key) or index (array position). Missing
    /// fields return `None`; the directive evaluator decides whether that's
    /// falsy (inside `when`) or `FieldNotFound` (elsewhere) (§4.3).
    pub fn get_field(&self, key: &str) -> Option<Value> {
        match &self.kind {
            ValueKind::Object(fields) => fields.get(key).cloned(),
            ValueKind::Structured(s) => s.data.get_field(key),
            _ => None,
        }
    }

    pub fn get_index(&self, index: usize) -> Option<Value> {
        match &self.kind {
            ValueKind::Array(items) => items.get(index).cloned(),
            ValueKind::Structured(s) => s.data.get_index(index),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match &self.kind {
            ValueKind::Null => serde_json::Value::Null,
            ValueKind::Bool(b) => serde_json::Value::Bool(*b),
            ValueKind::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueKind::Str(s) => serde_json::Value::String(s.clone()),
            ValueKind::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            ValueKind::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            ValueKind::LoadContent(lc) => serde_json::Value::String(lc.content.clone()),
            ValueKind::LoadContentArray(arr) => serde_json::Value::Array(
                arr.items
                    .iter()
                    .map(|lc| serde_json::Value::String(lc.content.clone()))
                    .collect(),
            ),
            ValueKind::Executable(exec) => serde_json::Value::String(exec.name.clone()),
            ValueKind::Structured(s) => s.data.to_json(),
            ValueKind::Lazy(thunk) => thunk
                .force()
                .map(|v| v.to_json())
                .unwrap_or(serde_json::Value::Null),
        }
    }

    /// Round-trip from a parsed JSON value (§8 round-trip law: `parse(@json(v)) = v`
    /// for JSON-representable v).
    pub fn from_json(json: serde_json::Value) -> Self {
        let kind = match json {
            serde_json::Value::Null => ValueKind::Null,
            serde_json::Value::Bool(b) => ValueKind::Bool(b),
            serde_json::Value::Number(n) => ValueKind::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => ValueKind::Str(s),
            serde_json::Value::Array(items) => {
                ValueKind::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => ValueKind::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        };
        Self::literal(kind, 0)
    }

    /// Union this value's labels with another's (label monotonicity, §3.2,
    /// §8 property 3).
    pub fn absorb_labels_from<'a>(&mut self, inputs: impl IntoIterator<Item = &'a Value>) {
        for input in inputs {
            self.meta.absorb_labels(&input.meta);
        }
    }
}

/// Numbers print without a trailing `.0` for integral values, matching the
/// common JSON/template-rendering convention the other examples follow.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
