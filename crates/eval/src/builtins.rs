//! Root-environment wiring (§2, §4.6 "every built-in is implemented as a
//! regular executable ... no special dispatch"): reserved slots plus the
//! `@json`/`@xml`/`@csv`/`@md` pipeline transformers, installed as ordinary
//! JS-bodied executables rather than a special-cased branch in the
//! expression evaluator.

use mlld_ast::{ExecBody, PathContext};
use mlld_env::{EnvArena, EnvHandle, ReservedValue};
use mlld_value::{Executable, Value};
use std::rc::Rc;

/// Install the reserved slots available from the program's root scope
/// (`@now`, `@base`, `@root`, `@debug`). `@ctx`/`@pipeline`/`@input` are
/// installed per pipeline scope instead (see `pipeline_invoker.rs`); `@fm`
/// is installed per imported-module scope (see `import.rs`); `@mx` mirrors
/// whichever resolver fetch is currently in scope, absent at the root.
pub fn install_root_reserved(arena: &mut EnvArena, root: EnvHandle, paths: &PathContext) {
    arena.install_reserved(
        root,
        "now",
        ReservedValue::Dynamic(Rc::new(|| {
            Value::string(chrono::Utc::now().to_rfc3339())
        })),
    );
    let base = paths.project_root.display().to_string();
    arena.install_reserved(root, "base", ReservedValue::Static(Value::string(base.clone())));
    arena.install_reserved(root, "root", ReservedValue::Static(Value::string(base)));
    arena.install_reserved(
        root,
        "debug",
        ReservedValue::Static(Value::object(indexmap::IndexMap::new())),
    );
}

// Each transformer returns `{text, data}`: `text` is what the pipeline
// stage renders/shows, `data` is the structured value `@input` on the next
// stage should see. `exec.rs` unwraps this shape into a `Structured` value
// for every exec carrying the `builtin-transformer` label (§3.1, §4.6).

const JSON_TRANSFORMER_BODY: &str = r#"
const text = typeof input === "string" ? input : JSON.stringify(input);
let data;
try {
    data = JSON.parse(text);
} catch (e) {
    data = text;
}
return { text: JSON.stringify(data, null, 2) + "\n", data };
"#;

const XML_TRANSFORMER_BODY: &str = r#"
function toXml(value, tag) {
    if (value === null || value === undefined) return `<${tag}/>`;
    if (typeof value !== "object") return `<${tag}>${String(value)}</${tag}>`;
    if (Array.isArray(value)) return value.map((v) => toXml(v, "item")).join("");
    const inner = Object.entries(value).map(([k, v]) => toXml(v, k)).join("");
    return `<${tag}>${inner}</${tag}>`;
}
const data = typeof input === "string" ? JSON.parse(input) : input;
return { text: toXml(data, "root"), data };
"#;

const CSV_TRANSFORMER_BODY: &str = r#"
const rows = typeof input === "string" ? JSON.parse(input) : input;
const list = Array.isArray(rows) ? rows : [rows];
const escape = (v) => {
    const s = v === null || v === undefined ? "" : String(v);
    return s.includes(",") || s.includes("\"") ? `"${s.replace(/"/g, '""')}"` : s;
};
let text = "";
if (list.length > 0) {
    const headers = Object.keys(list[0]);
    const lines = [headers.join(",")];
    for (const row of list) {
        lines.push(headers.map((h) => escape(row[h])).join(","));
    }
    text = lines.join("\n");
}
return { text, data: list };
"#;

const MD_TRANSFORMER_BODY: &str = r#"
function toMd(value, depth) {
    if (value === null || value === undefined) return "";
    if (typeof value !== "object") return String(value);
    if (Array.isArray(value)) return value.map((v) => `- ${toMd(v, depth + 1)}`).join("\n");
    return Object.entries(value)
        .map(([k, v]) => `${"#".repeat(Math.min(depth + 1, 6))} ${k}\n\n${toMd(v, depth + 1)}`)
        .join("\n\n");
}
const data = typeof input === "string" ? JSON.parse(input) : input;
return { text: toMd(data, 0), data };
"#;

/// The four built-in transformers, under their canonical lowercase names.
/// `register_default_transformers` additionally binds an uppercase alias for
/// each (§4.6 "plus case-insensitive aliases").
pub fn default_transformers() -> Vec<Executable> {
    let specs: &[(&str, &str)] = &[
        ("json", JSON_TRANSFORMER_BODY),
        ("xml", XML_TRANSFORMER_BODY),
        ("csv", CSV_TRANSFORMER_BODY),
        ("md", MD_TRANSFORMER_BODY),
    ];
    specs
        .iter()
        .map(|(name, body)| {
            Executable::new(
                name.to_string(),
                vec!["input".to_string()],
                ExecBody::Code {
                    lang: mlld_ast::Lang::Js,
                    body: body.to_string(),
                },
            )
            .with_labels(["builtin-transformer".to_string()])
        })
        .collect()
}

/// Bind every default transformer into `handle` under its canonical
/// (lowercase) name plus an uppercase alias (`@JSON`, `@XML`, `@CSV`, `@MD`)
/// pointing at the same `Rc<Executable>` — two bindings, one body, so the
/// alias can never drift from the canonical transformer's behavior.
pub fn register_default_transformers(arena: &mut EnvArena, handle: EnvHandle) -> Result<(), mlld_errors::VariableError> {
    for exec in default_transformers() {
        let upper = exec.name.to_uppercase();
        let exec = Rc::new(exec);
        arena.set(handle, &exec.name.clone(), Value::literal(mlld_value::ValueKind::Executable(exec.clone()), 0))?;
        arena.set(handle, &upper, Value::literal(mlld_value::ValueKind::Executable(exec), 0))?;
    }
    Ok(())
}
