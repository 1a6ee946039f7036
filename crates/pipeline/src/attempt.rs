//! One recorded pipeline stage attempt (§3.3 "Attempt log"), the unit both
//! `@pipeline.tries` and `@pipeline.all.tries` are built from.

use mlld_value::Value;

#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub stage: usize,
    pub attempt: u32,
    pub input: Value,
    pub output: Option<Value>,
    pub error: Option<String>,
    /// Retry window this attempt belongs to; see [`crate::ledger::RetryLedger`].
    pub context_id: u32,
}

impl AttemptRecord {
    pub fn started(stage: usize, attempt: u32, input: Value) -> Self {
        Self {
            stage,
            attempt,
            input,
            output: None,
            error: None,
            context_id: 0,
        }
    }

    pub fn in_context(mut self, context_id: u32) -> Self {
        self.context_id = context_id;
        self
    }

    /// Render as the object shape `@pipeline.tries`/`@pipeline.all.tries`
    /// elements expose: `{stage, attempt, input, output, error?}`.
    pub fn to_value(&self) -> Value {
        let mut fields = indexmap::IndexMap::new();
        fields.insert("stage".to_string(), Value::number(self.stage as f64));
        fields.insert("attempt".to_string(), Value::number(self.attempt as f64));
        fields.insert("input".to_string(), self.input.clone());
        fields.insert(
            "output".to_string(),
            self.output.clone().unwrap_or_else(Value::null),
        );
        if let Some(error) = &self.error {
            fields.insert("error".to_string(), Value::string(error.clone()));
        }
        Value::object(fields)
    }
}
