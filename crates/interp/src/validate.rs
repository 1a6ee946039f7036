//! The analyzer/validator report (§6.5). The interpreter core already
//! tracks executables/exports/imports/guards for its own purposes
//! (`mlld_eval::Bookkeeping`); this module just shapes that, plus a static
//! anti-pattern sweep over the program text, into the JSON the
//! out-of-scope CLI/analyzer collaborator prints.

use mlld_ast::{DirectiveKind, ExecBody, Expr, Program};
use mlld_eval::Bookkeeping;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One of the fixed anti-pattern codes (§6.5), suppressible by project
/// config (suppression itself is a CLI/config concern, out of scope here —
/// this module only ever reports, never filters by a suppress list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntiPattern {
    pub code: String,
    pub message: String,
    pub directive_index: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub filepath: String,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub redefinitions: Vec<String>,
    #[serde(rename = "antiPatterns")]
    pub anti_patterns: Vec<AntiPattern>,
    pub executables: Vec<String>,
    pub exports: Vec<String>,
    pub imports: Vec<String>,
    pub guards: Vec<String>,
    pub needs: BTreeMap<String, bool>,
    pub ast: Option<serde_json::Value>,
}

/// Build a report from a program's static shape plus whatever bookkeeping
/// an evaluation pass (if one ran) recorded. `bookkeeping` may be a fresh
/// default for a purely static (pre-evaluation) validation pass.
pub fn build_report(program: &Program, bookkeeping: &Bookkeeping, filepath: &str) -> Report {
    let redefinitions = find_redefinitions(program);
    let anti_patterns = find_anti_patterns(program);
    let needs = collect_needs(program);

    Report {
        filepath: filepath.to_string(),
        valid: redefinitions.is_empty(),
        errors: Vec::new(),
        warnings: Vec::new(),
        redefinitions,
        anti_patterns,
        executables: bookkeeping.executables.clone(),
        exports: bookkeeping.exports.clone(),
        imports: bookkeeping.imports.clone(),
        guards: bookkeeping.guards.clone(),
        needs,
        ast: None,
    }
}

/// Top-level `/var @name = …` appearing more than once — a static
/// approximation of the immutability invariant (§8 property 1), since a
/// true check needs the evaluator's scope tree; this flags the common case
/// the CLI wants to warn about before running anything.
fn find_redefinitions(program: &Program) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut repeats = BTreeSet::new();
    for directive in &program.directives {
        if let DirectiveKind::Var { name, .. } = &directive.kind {
            if !seen.insert(name.clone()) {
                repeats.insert(name.clone());
            }
        }
    }
    repeats.into_iter().collect()
}

fn find_anti_patterns(program: &Program) -> Vec<AntiPattern> {
    let mut found = Vec::new();
    let mut bound_names = BTreeSet::new();

    for (index, directive) in program.directives.iter().enumerate() {
        match &directive.kind {
            DirectiveKind::Var { name, .. } => {
                if bound_names.contains(name) {
                    found.push(AntiPattern {
                        code: "mutable-state".to_string(),
                        message: format!("@{name} is reassigned; mlld bindings are immutable"),
                        directive_index: index,
                    });
                }
                bound_names.insert(name.clone());
            }
            DirectiveKind::Exe { name, params, body, .. } => {
                for param in params {
                    if mlld_env::is_reserved(&param.name) || bound_names.contains(&param.name) {
                        found.push(AntiPattern {
                            code: "exe-parameter-shadowing".to_string(),
                            message: format!(
                                "@{name}'s parameter @{} shadows an outer binding or reserved name",
                                param.name
                            ),
                            directive_index: index,
                        });
                    }
                }
                if let ExecBody::Code { body, .. } = body {
                    if body.contains("when") && !body.contains("return") {
                        found.push(AntiPattern {
                            code: "when-exe-implicit-return".to_string(),
                            message: format!(
                                "@{name}'s body uses `when` without an explicit return"
                            ),
                            directive_index: index,
                        });
                    }
                }
            }
            DirectiveKind::Show { expr } | DirectiveKind::Run { expr } => {
                if uses_direct_json_call(expr) {
                    found.push(AntiPattern {
                        code: "deprecated-json-transform".to_string(),
                        message: "@json(...) called directly; pipe through `| @json` instead"
                            .to_string(),
                        directive_index: index,
                    });
                }
            }
            _ => {}
        }
    }
    found
}

fn uses_direct_json_call(expr: &Expr) -> bool {
    match expr {
        Expr::ExecInvocation { name, .. } => name == "json" || name == "JSON",
        Expr::Pipe { source, .. } => uses_direct_json_call(source),
        Expr::Not(inner) => uses_direct_json_call(inner),
        _ => false,
    }
}

/// Scans every `/exe` code body for its language, producing the `needs`
/// subset `module.yml` would declare (§6.4).
fn collect_needs(program: &Program) -> BTreeMap<String, bool> {
    let mut needs = BTreeMap::new();
    for directive in &program.directives {
        if let DirectiveKind::Exe { body: ExecBody::Code { lang, .. }, .. } = &directive.kind {
            let key = match lang {
                mlld_ast::Lang::Js => "js",
                mlld_ast::Lang::Node => "node",
                mlld_ast::Lang::Python => "py",
                mlld_ast::Lang::Sh => "sh",
            };
            needs.insert(key.to_string(), true);
        }
    }
    needs
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlld_ast::{Directive, Param};
    use mlld_errors::SourceSpan;

    fn at(line: u32) -> SourceSpan {
        SourceSpan::new(Some("main.mld".into()), line, 1)
    }

    #[test]
    fn flags_repeated_top_level_bindings() {
        let program = Program::new(vec![
            Directive::new(DirectiveKind::Var { name: "x".into(), expr: Expr::str("a") }, at(1)),
            Directive::new(DirectiveKind::Var { name: "x".into(), expr: Expr::str("b") }, at(2)),
        ]);
        let report = build_report(&program, &Bookkeeping::default(), "main.mld");
        assert_eq!(report.redefinitions, vec!["x".to_string()]);
        assert!(!report.valid);
    }

    #[test]
    fn flags_parameter_shadowing_a_reserved_name() {
        let program = Program::new(vec![Directive::new(
            DirectiveKind::Exe {
                name: "f".into(),
                params: vec![Param { name: "ctx".into() }],
                body: ExecBody::Code { lang: mlld_ast::Lang::Js, body: "return 1".into() },
                labels: vec![],
            },
            at(1),
        )]);
        let report = build_report(&program, &Bookkeeping::default(), "main.mld");
        assert!(report
            .anti_patterns
            .iter()
            .any(|a| a.code == "exe-parameter-shadowing"));
    }

    #[test]
    fn collects_needs_from_exe_bodies() {
        let program = Program::new(vec![Directive::new(
            DirectiveKind::Exe {
                name: "f".into(),
                params: vec![],
                body: ExecBody::Code { lang: mlld_ast::Lang::Python, body: "return 1".into() },
                labels: vec![],
            },
            at(1),
        )]);
        let report = build_report(&program, &Bookkeeping::default(), "main.mld");
        assert_eq!(report.needs.get("py"), Some(&true));
    }

    #[test]
    fn no_findings_for_a_clean_program() {
        let program = Program::new(vec![
            Directive::new(DirectiveKind::Var { name: "name".into(), expr: Expr::str("Ada") }, at(1)),
            Directive::new(DirectiveKind::Show { expr: Expr::var("name") }, at(2)),
        ]);
        let report = build_report(&program, &Bookkeeping::default(), "main.mld");
        assert!(report.valid);
        assert!(report.anti_patterns.is_empty());
    }
}
