//! End-to-end specs for the interpreter core: build programs directly out
//! of `mlld_ast` constructors (no parser in this crate) and drive them
//! through `mlld_interp::process_program`, asserting on the externally
//! observable result — rendered text, structured output, and exit code.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use mlld_ast::{
    BlockStmt, Directive, DirectiveKind, ExecBody, Expr, FieldStep, ForSpec, ImportForm,
    ImportMode, Lang, Literal, OutputFormat, OutputTarget, Param, Program, StreamKind, Template,
    TemplateKind, TemplatePart, WhenArm, WhenForm, WhenModifier,
};
use mlld_errors::{EvalError, ImportError, PipelineError, SourceSpan, VariableError};
use mlld_interp::{process_program, ExitCode, ProcessOptions};
use std::collections::HashMap;
use std::rc::Rc;

fn at(line: u32) -> SourceSpan {
    SourceSpan::new(Some("main.mld".into()), line, 1)
}

fn options_in(dir: &std::path::Path) -> ProcessOptions {
    let mut options = ProcessOptions::default();
    options.host.project_root = dir.to_path_buf();
    options.host.lock_path = dir.join("mlld.lock.json");
    options
}

fn var(name: &str, expr: Expr, line: u32) -> Directive {
    Directive::new(DirectiveKind::Var { name: name.to_string(), expr }, at(line))
}

fn show(expr: Expr, line: u32) -> Directive {
    Directive::new(DirectiveKind::Show { expr }, at(line))
}

fn backtick(parts: Vec<TemplatePart>) -> Expr {
    Expr::Interpolated(Template { kind: TemplateKind::Backtick, parts })
}

fn sh_exec(name: &str, params: &[&str], body: &str, line: u32) -> Directive {
    Directive::new(
        DirectiveKind::Exe {
            name: name.to_string(),
            params: params.iter().map(|p| Param { name: p.to_string() }).collect(),
            body: ExecBody::Code { lang: Lang::Sh, body: body.to_string() },
            labels: Vec::new(),
        },
        at(line),
    )
}

fn js_exec(name: &str, params: &[&str], body: &str, line: u32) -> Directive {
    Directive::new(
        DirectiveKind::Exe {
            name: name.to_string(),
            params: params.iter().map(|p| Param { name: p.to_string() }).collect(),
            body: ExecBody::Code { lang: Lang::Js, body: body.to_string() },
            labels: Vec::new(),
        },
        at(line),
    )
}

// ---------------------------------------------------------------------
// Scenario 1: a binding interpolated into a shown template.
// ---------------------------------------------------------------------

#[tokio::test]
async fn binding_is_visible_to_a_later_show() {
    let dir = tempfile::tempdir().unwrap();
    let program = Program::new(vec![
        var("city", Expr::str("Lagos"), 1),
        show(
            backtick(vec![
                TemplatePart::Text("welcome to ".to_string()),
                TemplatePart::Var { name: "city".into(), path: vec![], pipes: vec![] },
            ]),
            2,
        ),
    ]);

    let output = process_program(&program, options_in(dir.path())).await.unwrap();
    assert_eq!(output.text, "welcome to Lagos");
    assert_eq!(output.exit_code, ExitCode::Success);
}

// ---------------------------------------------------------------------
// Scenario 2: a pipe stage routed through the real (node-backed) @json
// transformer. `@json` re-normalizes its input into pretty 2-space JSON
// text (not the bare parsed object `JSON.parse` alone would give back),
// so a shown pipe result is human-readable text, and piping that text
// straight back through `@json` reproduces the same structured value —
// the round-trip law `parse(@json(v)) = v`.
// ---------------------------------------------------------------------

#[tokio::test]
async fn json_pipe_stage_renders_pretty_printed_text() {
    let dir = tempfile::tempdir().unwrap();
    let program = Program::new(vec![
        js_exec("emit", &[], "return '{\"count\":2}';", 1),
        show(
            Expr::Pipe {
                source: Box::new(Expr::ExecInvocation { name: "emit".to_string(), args: vec![] }),
                stages: vec![mlld_ast::PipelineStage {
                    exec_name: "json".to_string(),
                    args: vec![],
                    location: at(2),
                }],
            },
            2,
        ),
    ]);

    let output = process_program(&program, options_in(dir.path())).await.unwrap();
    assert_eq!(output.text, "{\n  \"count\": 2\n}\n");
}

// ---------------------------------------------------------------------
// Scenario 3: `for ... parallel(N)` collects per-iteration errors instead
// of aborting the whole loop, and records them under @ctx.errors.
// ---------------------------------------------------------------------

#[tokio::test]
async fn parallel_for_collects_errors_without_aborting_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let program = Program::new(vec![
        sh_exec(
            "check",
            &["value"],
            "if [ \"$value\" = \"bad\" ]; then exit 1; fi\necho \"$value\"",
            1,
        ),
        var(
            "items",
            Expr::Literal(Literal::Array(vec![Expr::str("good"), Expr::str("bad"), Expr::str("also-good")])),
            2,
        ),
        var(
            "results",
            Expr::For(ForSpec {
                item: "item".to_string(),
                key: None,
                collection: Box::new(Expr::var("items")),
                parallel: Some(2),
                body: vec![BlockStmt::Let {
                    name: "checked".to_string(),
                    expr: Expr::ExecInvocation { name: "check".to_string(), args: vec![Expr::var("item")] },
                    location: at(3),
                }],
            }),
            3,
        ),
        show(Expr::var("results"), 4),
        show(Expr::field("ctx", vec![FieldStep::Name("errors".to_string())]), 5),
    ]);

    let output = process_program(&program, options_in(dir.path())).await.unwrap();
    let lines: Vec<&str> = output.text.splitn(2, '\n').collect();
    let results: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(results, serde_json::json!(["good", null, "also-good"]));

    let errors: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    let errors = errors.as_array().expect("errors should be an array");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["index"].as_f64(), Some(1.0));
    assert!(errors[0]["message"].as_str().unwrap().contains("command failed"));
}

// ---------------------------------------------------------------------
// Scenario 4: retry is only honored against a pipeline source that was
// itself produced by a call (retryable); a literal source is rejected.
// ---------------------------------------------------------------------

#[tokio::test]
async fn retry_against_a_literal_source_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let program = Program::new(vec![
        sh_exec("always_retry", &["value"], "echo retry", 1),
        var(
            "result",
            Expr::Pipe {
                source: Box::new(Expr::str("source text")),
                stages: vec![mlld_ast::PipelineStage {
                    exec_name: "always_retry".to_string(),
                    args: vec![],
                    location: at(2),
                }],
            },
            2,
        ),
    ]);

    let err = process_program(&program, options_in(dir.path())).await.unwrap_err();
    assert!(matches!(err.kind, EvalError::Pipeline(PipelineError::NonRetryableSource)));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn retry_against_a_call_produced_source_succeeds_on_the_second_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let counter_path = dir.path().join("attempts.txt");
    let counter_body = format!(
        "n=$(cat '{path}' 2>/dev/null || echo 0)\nn=$((n+1))\necho \"$n\" > '{path}'\nif [ \"$n\" -lt 2 ]; then echo retry; else echo done; fi",
        path = counter_path.display(),
    );

    let program = Program::new(vec![
        sh_exec("src", &[], "echo source", 1),
        sh_exec("counter", &["value"], &counter_body, 2),
        var(
            "result",
            Expr::Pipe {
                source: Box::new(Expr::ExecInvocation { name: "src".to_string(), args: vec![] }),
                stages: vec![mlld_ast::PipelineStage {
                    exec_name: "counter".to_string(),
                    args: vec![],
                    location: at(3),
                }],
            },
            3,
        ),
        show(Expr::var("result"), 4),
    ]);

    let output = process_program(&program, options_in(dir.path())).await.unwrap();
    assert_eq!(output.text, "done");
}

// ---------------------------------------------------------------------
// Scenario 5: a three-file import cycle is caught and reported as a
// circular import with the whole chain preserved.
// ---------------------------------------------------------------------

/// Maps a canonical file path to the program it should evaluate to,
/// standing in for the (out-of-scope) surface parser. Keyed by path
/// rather than by parsing the fetched bytes, since `/import` calls
/// `parser.parse(content, canonical)` with `canonical` as the lookup key
/// LocalResolver already resolved against real files on disk.
struct FixedPrograms {
    by_path: HashMap<String, Program>,
}

impl mlld_eval::ProgramParser for FixedPrograms {
    fn parse(&self, _source: &str, file_path: &str) -> Result<Program, ImportError> {
        self.by_path
            .get(file_path)
            .cloned()
            .ok_or_else(|| ImportError::FileNotFound { path: file_path.to_string() })
    }
}

fn import_bare(path_expr: Expr, line: u32) -> Directive {
    Directive::new(
        DirectiveKind::Import { form: ImportForm::Bare { source: path_expr, mode: ImportMode::Module } },
        at(line),
    )
}

#[tokio::test]
async fn a_three_file_import_cycle_is_detected_with_its_full_chain() {
    let dir = tempfile::tempdir().unwrap();
    let a_path = dir.path().join("a.mld");
    let b_path = dir.path().join("b.mld");
    // LocalResolver reads real bytes off disk before handing them to the
    // parser collaborator; the parser below ignores the content and keys
    // off the canonical path instead, so placeholder text is enough here.
    std::fs::write(&a_path, "# a").unwrap();
    std::fs::write(&b_path, "# b").unwrap();

    let a_str = a_path.to_string_lossy().into_owned();
    let b_str = b_path.to_string_lossy().into_owned();

    let a_program = Program::new(vec![import_bare(Expr::str(b_str.clone()), 1)]);
    let b_program = Program::new(vec![import_bare(Expr::str(a_str.clone()), 1)]);

    let mut by_path = HashMap::new();
    by_path.insert(a_str.clone(), a_program);
    by_path.insert(b_str.clone(), b_program);

    let root_program = Program::new(vec![import_bare(Expr::str(a_str.clone()), 1)]);

    let mut options = options_in(dir.path());
    options.parser = Some(Rc::new(FixedPrograms { by_path }));

    let err = process_program(&root_program, options).await.unwrap_err();
    match &err.kind {
        EvalError::Import(ImportError::CircularImport { chain }) => {
            assert_eq!(chain.len(), 3);
            assert_eq!(chain[0], chain[2]);
            assert_ne!(chain[0], chain[1]);
        }
        other => panic!("expected a circular import error, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 3);
}

// ---------------------------------------------------------------------
// Scenario 6: `when first` stops at the first truthy arm.
// ---------------------------------------------------------------------

#[tokio::test]
async fn when_first_stops_at_the_first_matching_arm() {
    let dir = tempfile::tempdir().unwrap();
    let program = Program::new(vec![
        var("tier", Expr::str("gold"), 1),
        var(
            "greeting",
            Expr::When(WhenForm::Block {
                modifier: WhenModifier::First,
                arms: vec![
                    WhenArm {
                        condition: Expr::boolean(false),
                        action: Expr::str("unreachable"),
                        is_default: false,
                        location: at(2),
                    },
                    WhenArm {
                        condition: Expr::var("tier"),
                        action: Expr::str("welcome, valued member"),
                        is_default: false,
                        location: at(3),
                    },
                    WhenArm {
                        condition: Expr::boolean(true),
                        action: Expr::str("default greeting"),
                        is_default: true,
                        location: at(4),
                    },
                ],
            }),
            5,
        ),
        show(Expr::var("greeting"), 6),
    ]);

    let output = process_program(&program, options_in(dir.path())).await.unwrap();
    assert_eq!(output.text, "welcome, valued member");
}

// ---------------------------------------------------------------------
// Invariants: immutability, reserved-name protection, output shaping.
// ---------------------------------------------------------------------

#[tokio::test]
async fn a_top_level_name_cannot_be_rebound() {
    let dir = tempfile::tempdir().unwrap();
    let program = Program::new(vec![
        var("x", Expr::str("first"), 1),
        var("x", Expr::str("second"), 2),
    ]);

    let err = process_program(&program, options_in(dir.path())).await.unwrap_err();
    assert!(matches!(
        err.kind,
        EvalError::Variable(VariableError::ImmutableRebinding { ref name }) if name == "x"
    ));
}

#[tokio::test]
async fn a_reserved_name_cannot_be_bound_over() {
    let dir = tempfile::tempdir().unwrap();
    let program = Program::new(vec![var("now", Expr::str("clobbered"), 1)]);

    let err = process_program(&program, options_in(dir.path())).await.unwrap_err();
    assert!(matches!(
        err.kind,
        EvalError::Variable(VariableError::ReservedName { ref name }) if name == "now"
    ));
}

#[tokio::test]
async fn output_format_json_populates_structured_alongside_text() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = options_in(dir.path());
    options.format = OutputFormat::Json;
    let program = Program::new(vec![show(Expr::str(r#"{"ok": true}"#), 1)]);

    let output = process_program(&program, options).await.unwrap();
    let structured = output.structured.expect("json format should populate structured output");
    assert_eq!(structured["ok"], serde_json::json!(true));
}

#[tokio::test]
async fn blank_line_runs_beyond_two_are_collapsed_in_the_final_text() {
    let dir = tempfile::tempdir().unwrap();
    let program = Program::new(vec![
        show(Expr::str("first"), 1),
        show(Expr::str("\n\n\n\nsecond"), 2),
    ]);

    let output = process_program(&program, options_in(dir.path())).await.unwrap();
    assert_eq!(output.text, "first\n\nsecond");
}

#[tokio::test]
async fn write_output_target_emits_a_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.txt");
    let mut options = options_in(dir.path());
    options.host.lock_path = dir.path().join("mlld.lock.json");

    let program = Program::new(vec![Directive::new(
        DirectiveKind::Output {
            expr: Expr::str("hello file"),
            target: OutputTarget::File(Expr::str(target.to_string_lossy().into_owned())),
            format: None,
        },
        at(1),
    )]);

    // `/output` to a file emits a Write effect; process_program's default
    // sink is in-memory, so this asserts the effect was *computed*, not
    // that it was realized as real I/O (that's `RealSink`'s job, exercised
    // in `mlld_effects`'s own suite).
    let output = process_program(&program, options).await.unwrap();
    assert_eq!(output.exit_code, ExitCode::Success);
    assert!(!target.exists());
}

// ---------------------------------------------------------------------
// Round-trip law: a value pushed through @json and read back with field
// access yields the same shape it started from.
// ---------------------------------------------------------------------

#[tokio::test]
async fn an_object_round_trips_through_the_json_transformer() {
    let dir = tempfile::tempdir().unwrap();
    let program = Program::new(vec![
        var("raw", Expr::str(r#"{"name": "Ada", "active": true}"#), 1),
        var(
            "parsed",
            Expr::Pipe {
                source: Box::new(Expr::var("raw")),
                stages: vec![mlld_ast::PipelineStage {
                    exec_name: "json".to_string(),
                    args: vec![],
                    location: at(2),
                }],
            },
            2,
        ),
        show(Expr::field("parsed", vec![FieldStep::Name("name".to_string())]), 3),
    ]);

    let output = process_program(&program, options_in(dir.path())).await.unwrap();
    assert_eq!(output.text, "Ada");
}

#[tokio::test]
async fn executable_results_are_marked_retryable_even_when_the_body_is_a_template() {
    // A template-bodied exec's call result must still be retryable (§4.6):
    // retryability is a property of "produced by a call", not of which
    // body variant produced it. Piping straight into an always-retry stage
    // and observing it succeed (rather than NonRetryableSource) is the
    // only externally observable proof of that, since `meta.retryable`
    // itself isn't exposed to mlld source.
    let dir = tempfile::tempdir().unwrap();
    let counter_path = dir.path().join("attempts.txt");
    let counter_body = format!(
        "n=$(cat '{path}' 2>/dev/null || echo 0)\nn=$((n+1))\necho \"$n\" > '{path}'\nif [ \"$n\" -lt 2 ]; then echo retry; else echo done; fi",
        path = counter_path.display(),
    );

    let program = Program::new(vec![
        Directive::new(
            DirectiveKind::Exe {
                name: "greet".to_string(),
                params: vec![],
                body: ExecBody::Template(Template { kind: TemplateKind::DoubleQuote, parts: vec![TemplatePart::Text("hi".to_string())] }),
                labels: Vec::new(),
            },
            at(1),
        ),
        sh_exec("counter", &["value"], &counter_body, 2),
        var(
            "result",
            Expr::Pipe {
                source: Box::new(Expr::ExecInvocation { name: "greet".to_string(), args: vec![] }),
                stages: vec![mlld_ast::PipelineStage {
                    exec_name: "counter".to_string(),
                    args: vec![],
                    location: at(3),
                }],
            },
            3,
        ),
        show(Expr::var("result"), 4),
    ]);

    let output = process_program(&program, options_in(dir.path())).await.unwrap();
    assert_eq!(output.text, "done");
}
