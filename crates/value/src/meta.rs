//! Provenance metadata carried on every runtime value (§3.1 "Shared metadata").

use std::collections::BTreeSet;

/// Where a value's content originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Literal,
    File(String),
    Url(String),
    Dynamic,
}

/// The provenance record attached to every [`crate::Value`].
///
/// Labels are monotonically accumulated (§3.2 invariants, §8 property 3): no
/// operation in the evaluator strips a label, it only unions more in.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMeta {
    pub labels: BTreeSet<String>,
    pub source: Source,
    pub timestamp_ms: u64,
    pub size: Option<u64>,
    /// True when this value's source is a callable (not a literal), making
    /// it eligible for pipeline stage-0 re-execution (§4.6 invariants).
    pub retryable: bool,
}

impl ValueMeta {
    pub fn literal(timestamp_ms: u64) -> Self {
        Self {
            labels: BTreeSet::new(),
            source: Source::Literal,
            timestamp_ms,
            size: None,
            retryable: false,
        }
    }

    pub fn from_call(timestamp_ms: u64) -> Self {
        Self {
            labels: BTreeSet::new(),
            source: Source::Literal,
            timestamp_ms,
            size: None,
            retryable: true,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Union this value's labels with another's in place (monotonic: never
    /// removes labels, only adds).
    pub fn absorb_labels(&mut self, other: &ValueMeta) {
        self.labels.extend(other.labels.iter().cloned());
    }

    /// Union labels across every input metadata to a derived value (§8
    /// property 3: `labels(V) ⊇ ⋃ labels(Iᵢ)`).
    pub fn union_labels<'a>(inputs: impl IntoIterator<Item = &'a ValueMeta>) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for meta in inputs {
            out.extend(meta.labels.iter().cloned());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_labels_is_additive_only() {
        let mut a = ValueMeta::literal(0).with_label("untrusted");
        let b = ValueMeta::literal(0).with_label("src:dynamic");
        a.absorb_labels(&b);
        assert!(a.labels.contains("untrusted"));
        assert!(a.labels.contains("src:dynamic"));
    }

    #[test]
    fn union_labels_covers_every_input() {
        let a = ValueMeta::literal(0).with_label("x");
        let b = ValueMeta::literal(0).with_label("y");
        let c = ValueMeta::literal(0);
        let union = ValueMeta::union_labels([&a, &b, &c]);
        assert!(union.contains("x"));
        assert!(union.contains("y"));
    }
}
