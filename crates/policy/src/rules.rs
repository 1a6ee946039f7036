//! Label-based policy rules (§4.7): `labels: { L: { deny: [OP] } }`,
//! consulted at every operation site.

use indexmap::IndexMap;
use mlld_errors::PolicyError;
use mlld_value::ValueMeta;
use std::collections::BTreeSet;

/// What a single label denies.
#[derive(Debug, Clone, Default)]
pub struct LabelRule {
    pub deny: Vec<String>,
}

/// The full policy configuration: one rule set per label.
#[derive(Debug, Clone, Default)]
pub struct PolicyConfig {
    pub labels: IndexMap<String, LabelRule>,
}

impl PolicyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(mut self, label: impl Into<String>, operation: impl Into<String>) -> Self {
        self.labels
            .entry(label.into())
            .or_default()
            .deny
            .push(operation.into());
        self
    }

    /// Check whether `operation` is permitted for a value carrying `labels`.
    /// Denies if any label in the set has `operation` in its `deny` list.
    pub fn check(&self, labels: &BTreeSet<String>, operation: &str) -> Result<(), PolicyError> {
        for label in labels {
            if let Some(rule) = self.labels.get(label) {
                if rule.deny.iter().any(|op| op == operation) {
                    return Err(PolicyError::PolicyDenial {
                        label: label.clone(),
                        operation: operation.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Built-in policy rule: outputs of `llm`-labeled executables are
/// auto-tagged `influenced` (§4.7). Applied to the metadata of a value
/// returned by invoking an executable carrying the `llm` label.
pub fn apply_untrusted_llm_rule(exec_labels: &BTreeSet<String>, result_meta: &mut ValueMeta) {
    if exec_labels.contains("llm") {
        result_meta.labels.insert("influenced".to_string());
    }
}

/// Resolution of SPEC_FULL.md Open Question 4: when a `/guard after` fires
/// relative to pipeline retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardAfterTiming {
    #[default]
    FinalOnly,
    EveryAttempt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_rule_blocks_matching_label_and_operation() {
        let config = PolicyConfig::new().deny("secret", "op:show");
        let labels: BTreeSet<String> = ["secret".to_string()].into_iter().collect();
        let err = config.check(&labels, "op:show").unwrap_err();
        assert!(matches!(err, PolicyError::PolicyDenial { .. }));
    }

    #[test]
    fn unrelated_operation_is_allowed() {
        let config = PolicyConfig::new().deny("secret", "op:show");
        let labels: BTreeSet<String> = ["secret".to_string()].into_iter().collect();
        assert!(config.check(&labels, "op:run").is_ok());
    }

    #[test]
    fn untrusted_llm_rule_tags_influenced() {
        let exec_labels: BTreeSet<String> = ["llm".to_string()].into_iter().collect();
        let mut meta = ValueMeta::literal(0);
        apply_untrusted_llm_rule(&exec_labels, &mut meta);
        assert!(meta.labels.contains("influenced"));
    }

    #[test]
    fn non_llm_executable_does_not_tag_influenced() {
        let exec_labels: BTreeSet<String> = ["util".to_string()].into_iter().collect();
        let mut meta = ValueMeta::literal(0);
        apply_untrusted_llm_rule(&exec_labels, &mut meta);
        assert!(!meta.labels.contains("influenced"));
    }
}
