//! The `ShadowExecutor` trait (§4.4 body variant 3: run `js`/`node`/
//! `python`/`sh` bodies with parameter marshaling and return-value
//! demarshaling) and the request shape every implementation consumes.

use crate::marshal::{BoundParam, ParamTypeInfo};
use async_trait::async_trait;
use indexmap::IndexMap;
use mlld_ast::Lang;
use mlld_errors::CommandError;
use mlld_value::{Executable, Value};
use std::time::Duration;

/// One call into a shadow runtime: a code body, its bound parameters, and
/// any shadow-env helper executables registered for this language
/// (§4.4 "Shadow environment registration").
#[derive(Debug, Clone)]
pub struct ExecRequest {
    pub lang: Lang,
    pub body: String,
    pub params: Vec<BoundParam>,
    pub type_info: IndexMap<String, ParamTypeInfo>,
    pub helpers: Vec<(String, Executable)>,
    pub timeout: Duration,
}

impl ExecRequest {
    pub fn new(lang: Lang, body: impl Into<String>, params: Vec<BoundParam>, timeout: Duration) -> Self {
        let type_info = crate::marshal::metadata_table(&params);
        Self {
            lang,
            body: body.into(),
            params,
            type_info,
            helpers: Vec::new(),
            timeout,
        }
    }

    pub fn with_helpers(mut self, helpers: Vec<(String, Executable)>) -> Self {
        self.helpers = helpers;
        self
    }
}

/// Runs a shadow body and demarshals its return value (§4.4: "Return value
/// captured as JSON; parsed back into a value if it round-trips").
#[async_trait]
pub trait ShadowExecutor: Send + Sync {
    fn lang(&self) -> Lang;
    async fn execute(&self, request: &ExecRequest) -> Result<Value, CommandError>;
}

/// Parse a shadow process's captured stdout: the last non-empty line is
/// expected to be a JSON value (§4.4); if it fails to parse, the raw
/// trimmed text is carried as a plain string rather than erroring, since a
/// body that doesn't explicitly `return`/`print` structured output should
/// still produce *something* usable.
pub fn demarshal_stdout(stdout: &str) -> Value {
    let last_line = stdout.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    match serde_json::from_str::<serde_json::Value>(last_line) {
        Ok(json) => Value::from_json(json),
        Err(_) => Value::string(stdout.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demarshal_parses_trailing_json_line() {
        let value = demarshal_stdout("some log line\n{\"count\":2}\n");
        assert_eq!(value.get_field("count"), Some(Value::number(2.0)));
    }

    #[test]
    fn demarshal_falls_back_to_plain_string() {
        let value = demarshal_stdout("hello world\n");
        assert_eq!(value, Value::string("hello world".to_string()));
    }
}
