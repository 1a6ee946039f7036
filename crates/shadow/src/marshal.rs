//! Parameter marshaling into shadow environments (§4.4).
//!
//! Primitives and objects/arrays pass through as their native JSON shape
//! (`Value::to_json` already collapses `LoadContent` to its `content`
//! string, so the "least-surprise" rule falls out of the existing
//! conversion rather than needing a second one here). Missing arguments
//! bind to JSON `null`, matching the target language's undefined/null.

use indexmap::IndexMap;
use mlld_value::Value;

/// One positional parameter bound (or defaulted) for a shadow call.
#[derive(Debug, Clone)]
pub struct BoundParam {
    pub name: String,
    pub value: Value,
}

/// Bind `params` (declared parameter names, in order) against `args`
/// (evaluated call-site values). Extra args beyond the declared params are
/// dropped; missing args default to `Value::null()` (§4.4 "Missing
/// arguments bind to the language's undefined/null").
pub fn bind_params(params: &[String], args: &[Value]) -> Vec<BoundParam> {
    params
        .iter()
        .enumerate()
        .map(|(i, name)| BoundParam {
            name: name.clone(),
            value: args.get(i).cloned().unwrap_or_else(Value::null),
        })
        .collect()
}

/// Marshal a value into the JSON form a JS/Node/Python shadow receives.
pub fn to_shadow_json(value: &Value) -> serde_json::Value {
    value.to_json()
}

/// Marshal a value into the string form a shell body receives (§4.4: "Shell
/// receives string forms only via a dedicated bash adapter").
pub fn to_shell_string(value: &Value) -> String {
    value.coerce_to_string()
}

/// Type-info exposed to JS/Node/Python bodies through the injected `mlld`
/// helper (`getType`, `isVariable`, `getMetadata`), keyed by parameter name.
#[derive(Debug, Clone)]
pub struct ParamTypeInfo {
    pub type_name: String,
    pub metadata: serde_json::Value,
}

pub fn type_name(value: &Value) -> &'static str {
    use mlld_value::ValueKind::*;
    match &value.kind {
        Null => "null",
        Bool(_) => "boolean",
        Number(_) => "number",
        Str(_) => "string",
        Array(_) => "array",
        Object(_) => "object",
        LoadContent(_) => "load-content",
        LoadContentArray(_) => "load-content-array",
        Executable(_) => "executable",
        Structured(_) => "structured",
        Lazy(_) => "lazy",
    }
}

pub fn metadata_table(params: &[BoundParam]) -> IndexMap<String, ParamTypeInfo> {
    params
        .iter()
        .map(|p| {
            (
                p.name.clone(),
                ParamTypeInfo {
                    type_name: type_name(&p.value).to_string(),
                    metadata: serde_json::json!({
                        "labels": p.value.meta.labels.iter().collect::<Vec<_>>(),
                        "retryable": p.value.meta.retryable,
                    }),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_params_defaults_missing_args_to_null() {
        let params = vec!["a".to_string(), "b".to_string()];
        let args = vec![Value::string("x")];
        let bound = bind_params(&params, &args);
        assert_eq!(bound[0].value, Value::string("x"));
        assert!(bound[1].value.is_null());
    }

    #[test]
    fn bind_params_drops_extra_args() {
        let params = vec!["a".to_string()];
        let args = vec![Value::string("x"), Value::string("y")];
        let bound = bind_params(&params, &args);
        assert_eq!(bound.len(), 1);
    }

    #[test]
    fn type_name_reports_primitive_kinds() {
        assert_eq!(type_name(&Value::string("x")), "string");
        assert_eq!(type_name(&Value::number(1.0)), "number");
        assert_eq!(type_name(&Value::null()), "null");
    }
}
