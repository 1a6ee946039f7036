//! Dynamic module injection (§4.5 "Dynamic modules"): an object passed in
//! from the embedding SDK is serialized to mlld source text and imported
//! like any other module, subject to size/shape limits so a pathological
//! object can't blow up the parser or the node arena downstream.

use mlld_errors::ImportError;
use serde_json::Value as JsonValue;

const MAX_DEPTH: usize = 10;
const MAX_CONTAINER_ITEMS: usize = 1000;
const MAX_TOTAL_NODES: usize = 10_000;
const MAX_SERIALIZED_BYTES: usize = 1024 * 1024;

struct Budget {
    nodes: usize,
}

/// Render a JSON object into `/var` declarations forming a synthetic mlld
/// module source, enforcing §4.5's depth/key/node-count/size limits.
pub fn serialize_dynamic_module(object: &JsonValue) -> Result<String, ImportError> {
    let JsonValue::Object(map) = object else {
        return Err(ImportError::DynamicModuleTooLarge {
            reason: "dynamic module root must be an object".to_string(),
        });
    };
    let mut budget = Budget { nodes: 0 };
    let mut source = String::new();
    for (key, value) in map {
        let rendered = render_value(value, 1, &mut budget)?;
        source.push_str(&format!("/var @{key} = {rendered}\n"));
    }
    if source.len() > MAX_SERIALIZED_BYTES {
        return Err(ImportError::DynamicModuleTooLarge {
            reason: format!("serialized module is {} bytes, exceeds {MAX_SERIALIZED_BYTES}", source.len()),
        });
    }
    Ok(source)
}

fn render_value(value: &JsonValue, depth: usize, budget: &mut Budget) -> Result<String, ImportError> {
    if depth > MAX_DEPTH {
        return Err(ImportError::DynamicModuleTooLarge {
            reason: format!("nesting exceeds max depth {MAX_DEPTH}"),
        });
    }
    budget.nodes += 1;
    if budget.nodes > MAX_TOTAL_NODES {
        return Err(ImportError::DynamicModuleTooLarge {
            reason: format!("exceeds max node count {MAX_TOTAL_NODES}"),
        });
    }
    match value {
        JsonValue::Null => Ok("null".to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::String(s) => Ok(format!("{:?}", s)),
        JsonValue::Array(items) => {
            if items.len() > MAX_CONTAINER_ITEMS {
                return Err(ImportError::DynamicModuleTooLarge {
                    reason: format!("array has {} items, exceeds {MAX_CONTAINER_ITEMS}", items.len()),
                });
            }
            let rendered: Result<Vec<String>, ImportError> =
                items.iter().map(|v| render_value(v, depth + 1, budget)).collect();
            Ok(format!("[{}]", rendered?.join(", ")))
        }
        JsonValue::Object(map) => {
            if map.len() > MAX_CONTAINER_ITEMS {
                return Err(ImportError::DynamicModuleTooLarge {
                    reason: format!("object has {} keys, exceeds {MAX_CONTAINER_ITEMS}", map.len()),
                });
            }
            let mut fields = Vec::with_capacity(map.len());
            for (key, value) in map {
                fields.push(format!("{:?}: {}", key, render_value(value, depth + 1, budget)?));
            }
            Ok(format!("{{{}}}", fields.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_flat_object_to_var_declarations() {
        let obj = json!({"name": "alice", "age": 30});
        let source = serialize_dynamic_module(&obj).unwrap();
        assert!(source.contains("/var @name = \"alice\""));
        assert!(source.contains("/var @age = 30"));
    }

    #[test]
    fn rejects_non_object_root() {
        let err = serialize_dynamic_module(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ImportError::DynamicModuleTooLarge { .. }));
    }

    #[test]
    fn rejects_excessive_nesting_depth() {
        let mut value = json!(1);
        for _ in 0..=MAX_DEPTH {
            value = json!({"nested": value});
        }
        let obj = json!({"root": value});
        let err = serialize_dynamic_module(&obj).unwrap_err();
        assert!(matches!(err, ImportError::DynamicModuleTooLarge { .. }));
    }

    #[test]
    fn rejects_oversized_container() {
        let items: Vec<i32> = (0..MAX_CONTAINER_ITEMS as i32 + 1).collect();
        let obj = json!({"list": items});
        let err = serialize_dynamic_module(&obj).unwrap_err();
        assert!(matches!(err, ImportError::DynamicModuleTooLarge { .. }));
    }
}
