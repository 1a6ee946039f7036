//! Wrapper-script generation for process-backed shadow executors.
//!
//! Each shadow call gets its own fresh interpreter process (§5: shadow
//! runtimes are "pooled per language" but "contexts are not shared between
//! concurrent tasks of the same language" — a fresh process per call
//! satisfies that without needing a persistent pool to manage). Helper
//! executables registered via shadow-env registration are inlined ahead of
//! the body when their own source language matches, since both run in the
//! same process invocation; a helper written in a different language can't
//! be called this way and is skipped (its name stays undefined, which
//! surfaces as the target language's own "undefined function" error if the
//! body tries to call it).

use crate::executor::ExecRequest;
use mlld_ast::{ExecBody, Lang};

fn json_literal(value: &serde_json::Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

/// Build the `mlld` helper object literal exposing `getType`/`isVariable`/
/// `getMetadata` (§4.4 "Type-info exposure"), for JS/Node/Python bodies.
fn mlld_helper_json(request: &ExecRequest) -> serde_json::Value {
    let types: serde_json::Map<String, serde_json::Value> = request
        .type_info
        .iter()
        .map(|(name, info)| (name.clone(), serde_json::Value::String(info.type_name.clone())))
        .collect();
    let metadata: serde_json::Map<String, serde_json::Value> = request
        .type_info
        .iter()
        .map(|(name, info)| (name.clone(), info.metadata.clone()))
        .collect();
    serde_json::json!({ "types": types, "metadata": metadata })
}

fn inlined_helpers(request: &ExecRequest, lang: Lang) -> String {
    let mut out = String::new();
    for (name, exec) in &request.helpers {
        if let ExecBody::Code { lang: helper_lang, body } = &exec.body {
            if *helper_lang == lang {
                match lang {
                    Lang::Js | Lang::Node => {
                        out.push_str(&format!(
                            "function {name}({params}) {{\n{body}\n}}\n",
                            params = exec.params.join(", "),
                        ));
                    }
                    Lang::Python => {
                        out.push_str(&format!(
                            "def {name}({params}):\n{body}\n",
                            params = exec.params.join(", "),
                            body = indent(body, "    "),
                        ));
                    }
                    Lang::Sh => {}
                }
            }
        }
    }
    out
}

fn indent(body: &str, prefix: &str) -> String {
    body.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A Node wrapper: param consts, the `mlld` helper, any inlined same-
/// language helpers, then the body run as an expression statement whose
/// completion value is JSON-printed on the final line.
pub fn build_js_script(request: &ExecRequest) -> String {
    let mut script = String::new();
    script.push_str("const mlld = (() => {\n");
    script.push_str(&format!(
        "  const __table = {};\n",
        json_literal(&mlld_helper_json(request))
    ));
    script.push_str(
        "  return {\n    getType: (n) => __table.types[n] ?? 'null',\n    isVariable: (n) => Object.prototype.hasOwnProperty.call(__table.types, n),\n    getMetadata: (n) => __table.metadata[n] ?? {},\n  };\n})();\n",
    );
    for param in &request.params {
        script.push_str(&format!(
            "const {} = {};\n",
            param.name,
            json_literal(&param.value.to_json())
        ));
    }
    script.push_str(&inlined_helpers(request, request.lang));
    script.push_str("const __mlld_result = (function() {\n");
    script.push_str(&request.body);
    script.push_str("\n})();\n");
    script.push_str("console.log(JSON.stringify(__mlld_result === undefined ? null : __mlld_result));\n");
    script
}

/// A Python wrapper mirroring `build_js_script`'s shape.
pub fn build_python_script(request: &ExecRequest) -> String {
    let mut script = String::new();
    script.push_str("import json\n\n");
    script.push_str("class _MlldHelper:\n");
    script.push_str(&format!(
        "    _types = {}\n",
        python_dict_literal(&mlld_helper_types(request))
    ));
    script.push_str(&format!(
        "    _metadata = {}\n",
        python_dict_literal(&mlld_helper_metadata(request))
    ));
    script.push_str("    def getType(self, n):\n        return self._types.get(n, 'null')\n");
    script.push_str("    def isVariable(self, n):\n        return n in self._types\n");
    script.push_str("    def getMetadata(self, n):\n        return self._metadata.get(n, {})\n");
    script.push_str("mlld = _MlldHelper()\n\n");
    for param in &request.params {
        script.push_str(&format!(
            "{} = json.loads({})\n",
            param.name,
            json_literal_as_python_str(&param.value.to_json())
        ));
    }
    script.push_str(&inlined_helpers(request, request.lang));
    script.push_str("def __mlld_body():\n");
    script.push_str(&indent(&request.body, "    "));
    script.push_str("\n\n__mlld_result = __mlld_body()\n");
    script.push_str("print(json.dumps(None if __mlld_result is None else __mlld_result))\n");
    script
}

fn mlld_helper_types(request: &ExecRequest) -> serde_json::Value {
    request
        .type_info
        .iter()
        .map(|(name, info)| (name.clone(), serde_json::Value::String(info.type_name.clone())))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn mlld_helper_metadata(request: &ExecRequest) -> serde_json::Value {
    request
        .type_info
        .iter()
        .map(|(name, info)| (name.clone(), info.metadata.clone()))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

/// Python dict literals reuse JSON syntax (`null`/`true`/`false` differ,
/// `json.loads` on the embedded string sidesteps that entirely).
fn python_dict_literal(value: &serde_json::Value) -> String {
    format!("json.loads({})", json_literal_as_python_str(value))
}

fn json_literal_as_python_str(value: &serde_json::Value) -> String {
    format!("{:?}", json_literal(value))
}

/// A shell body gets its parameters as plain string-valued shell variables
/// and nothing else (§4.4: "no helper functions leak into `$var`").
pub fn build_shell_script(request: &ExecRequest) -> String {
    let mut script = String::new();
    for param in &request.params {
        let shell_value = crate::marshal::to_shell_string(&param.value);
        script.push_str(&format!("{}={}\n", param.name, shell_quote(&shell_value)));
    }
    script.push_str(&request.body);
    script
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
