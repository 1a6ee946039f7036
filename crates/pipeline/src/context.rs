//! `@ctx` and `@pipeline` values exposed to a running stage (§4.6).

use crate::attempt::AttemptRecord;
use mlld_value::Value;

/// Values bound into a stage's local scope as `@ctx`.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub stage: usize,
    pub total: usize,
    pub attempt: u32,
    /// Set only inside a `for`-driven pipeline iteration.
    pub index: Option<usize>,
}

impl StageContext {
    pub fn to_value(&self) -> Value {
        let mut fields = indexmap::IndexMap::new();
        fields.insert("stage".to_string(), Value::number(self.stage as f64));
        fields.insert("total".to_string(), Value::number(self.total as f64));
        fields.insert("attempt".to_string(), Value::number(self.attempt as f64));
        fields.insert(
            "index".to_string(),
            self.index
                .map(|i| Value::number(i as f64))
                .unwrap_or_else(Value::null),
        );
        Value::object(fields)
    }
}

/// Values bound as `@pipeline` while a stage runs: the current attempt
/// count, the attempt log scoped to the active retry window, and the
/// full cross-pipeline attempt log under `.all.tries`.
#[derive(Debug, Clone)]
pub struct PipelineVars {
    pub try_count: u32,
    pub tries: Vec<AttemptRecord>,
    pub all_tries: Vec<AttemptRecord>,
}

impl PipelineVars {
    pub fn to_value(&self) -> Value {
        let mut fields = indexmap::IndexMap::new();
        fields.insert("try".to_string(), Value::number(self.try_count as f64));
        fields.insert(
            "tries".to_string(),
            Value::array(self.tries.iter().map(AttemptRecord::to_value).collect()),
        );
        let mut all = indexmap::IndexMap::new();
        all.insert(
            "tries".to_string(),
            Value::array(self.all_tries.iter().map(AttemptRecord::to_value).collect()),
        );
        fields.insert("all".to_string(), Value::object(all));
        Value::object(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_context_reports_null_index_outside_for() {
        let ctx = StageContext {
            stage: 2,
            total: 3,
            attempt: 1,
            index: None,
        };
        assert_eq!(ctx.to_value().get_field("index"), Some(Value::null()));
    }

    #[test]
    fn pipeline_vars_nests_all_tries_under_all() {
        let vars = PipelineVars {
            try_count: 1,
            tries: vec![],
            all_tries: vec![AttemptRecord::started(1, 1, Value::string("x"))],
        };
        let value = vars.to_value();
        let all = value.get_field("all").expect("all field");
        let tries = all.get_field("tries").expect("tries field");
        match tries.kind {
            mlld_value::ValueKind::Array(items) => assert_eq!(items.len(), 1),
            other => panic!("expected array, got {other:?}"),
        }
    }
}
