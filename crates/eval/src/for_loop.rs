//! `/for` evaluation (§4.2.2): iterates an array, object (as key/value
//! pairs), or `LoadContentArray`, running the body once per element in a
//! fresh child scope.

use crate::context::EvalContext;
use crate::future::BoxFuture;
use mlld_ast::ForSpec;
use mlld_env::{EnvHandle, EnvKind, ReservedValue};
use mlld_errors::{EvalError, VariableError};
use mlld_value::{Value, ValueKind};

pub fn eval_for<'a>(
    ctx: &'a mut EvalContext,
    handle: EnvHandle,
    spec: &'a ForSpec,
) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(async move {
        let collection = crate::expr::eval_expr(ctx, handle, &spec.collection).await?;
        let entries = iterate(&collection)?;
        let length = entries.len();

        let mut results: Vec<Value> = Vec::with_capacity(length);
        let mut errors: Vec<Value> = Vec::new();

        // True concurrent scheduling would need a `Send` evaluator; the
        // arena and every captured executable here are `Rc`-based and
        // single-threaded, so `parallel(N)` differs from sequential mode
        // only in whether a failed iteration aborts the rest (§4.2.2
        // "errors are collected ... without aborting"), not in actual
        // concurrency.
        let collect_errors = spec.parallel.is_some();

        for (index, (key, item)) in entries.into_iter().enumerate() {
            let scope = ctx.arena.child(handle, EnvKind::Child);
            ctx.arena.set(scope, &spec.item, item.clone())?;
            if let Some(key_name) = &spec.key {
                ctx.arena.set(scope, key_name, key.clone())?;
            }
            ctx.arena.install_reserved(
                scope,
                "ctx",
                ReservedValue::Static(iteration_ctx(index, length)),
            );

            let outcome = crate::when::eval_block(ctx, scope, &spec.body).await;
            ctx.arena.destroy(scope);

            match outcome {
                Ok(value) => results.push(value),
                Err(err) if collect_errors => {
                    errors.push(error_entry(index, &err));
                    results.push(Value::null());
                }
                Err(err) => return Err(err),
            }
        }

        ctx.arena.install_reserved(handle, "ctx", ReservedValue::Static(summary_ctx(length, errors)));
        Ok(Value::array(results))
    })
}

fn iteration_ctx(index: usize, length: usize) -> Value {
    let mut fields = indexmap::IndexMap::new();
    fields.insert("index".to_string(), Value::number(index as f64));
    fields.insert("length".to_string(), Value::number(length as f64));
    Value::object(fields)
}

fn summary_ctx(length: usize, errors: Vec<Value>) -> Value {
    let mut fields = indexmap::IndexMap::new();
    fields.insert(
        "index".to_string(),
        if length == 0 { Value::null() } else { Value::number((length - 1) as f64) },
    );
    fields.insert("length".to_string(), Value::number(length as f64));
    fields.insert("errors".to_string(), Value::array(errors));
    Value::object(fields)
}

fn error_entry(index: usize, err: &EvalError) -> Value {
    let mut fields = indexmap::IndexMap::new();
    fields.insert("index".to_string(), Value::number(index as f64));
    fields.insert("message".to_string(), Value::string(err.to_string()));
    fields.insert("cause".to_string(), Value::string(format!("{err:?}")));
    Value::object(fields)
}

/// Resolve `COLL` into ordered `(key, value)` pairs (§4.2.2: array, object,
/// `LoadContentArray` are all iterable). Arrays and `LoadContentArray`s key
/// by numeric index; objects key by their field name.
fn iterate(collection: &Value) -> Result<Vec<(Value, Value)>, EvalError> {
    match &collection.kind {
        ValueKind::Array(items) => Ok(items
            .iter()
            .enumerate()
            .map(|(i, v)| (Value::number(i as f64), v.clone()))
            .collect()),
        ValueKind::Object(fields) => Ok(fields
            .iter()
            .map(|(k, v)| (Value::string(k.clone()), v.clone()))
            .collect()),
        ValueKind::LoadContentArray(array) => Ok(array
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let value = Value::new(
                    ValueKind::LoadContent(std::rc::Rc::new(item.clone())),
                    collection.meta.clone(),
                );
                (Value::number(i as f64), value)
            })
            .collect()),
        other => Err(VariableError::NotIterable { kind: format!("{other:?}") }.into()),
    }
}
