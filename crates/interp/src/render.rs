//! The top-level bordered error box (§7 "User-visible behavior"): message,
//! primary source location, a short frame stack, and the cause chain.
//!
//! The teacher has no literal box-drawing precedent to imitate — its
//! closest terminal-output code (`cli/src/commands/status.rs`'s
//! `render_frame`) redraws a line in place with ANSI cursor codes rather
//! than drawing a border. What *is* worth imitating is its texture: a
//! small, dependency-free function that builds one `String` by hand rather
//! than reaching for a TUI crate, matching how sparingly the teacher
//! pulls in presentation dependencies for one-shot CLI output.

use mlld_errors::InterpreterError;
use std::error::Error as StdError;

const WIDTH: usize = 72;

/// Renders a full-width bordered box around `error`'s message, location,
/// frame stack, and `std::error::Error::source()` cause chain.
pub fn bordered_box(error: &InterpreterError) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("error: {}", error.kind));
    if let Some(location) = &error.location {
        lines.push(format!("  at {location}"));
    }
    if !error.frames.is_empty() {
        lines.push(String::new());
        lines.push("frames:".to_string());
        for frame in &error.frames {
            lines.push(format!("  {frame}"));
        }
    }

    let causes = cause_chain(error);
    if !causes.is_empty() {
        lines.push(String::new());
        lines.push("caused by:".to_string());
        for (depth, cause) in causes.iter().enumerate() {
            lines.push(format!("  {}{}", "  ".repeat(depth), cause));
        }
    }

    if matches!(error.kind, mlld_errors::EvalError::Import(_)) {
        lines.push(String::new());
        lines.push("hint: try `mlld install` or `mlld clean`".to_string());
    }

    draw_box(&lines)
}

fn cause_chain(error: &InterpreterError) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Option<&dyn StdError> = error.kind.source();
    while let Some(source) = current {
        out.push(source.to_string());
        current = source.source();
    }
    out
}

fn draw_box(lines: &[String]) -> String {
    let inner_width = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(WIDTH - 4);
    let mut out = String::new();
    out.push('┌');
    out.push_str(&"─".repeat(inner_width + 2));
    out.push_str("┐\n");
    for line in lines {
        out.push_str("│ ");
        out.push_str(line);
        let pad = inner_width.saturating_sub(line.chars().count());
        out.push_str(&" ".repeat(pad));
        out.push_str(" │\n");
    }
    out.push('└');
    out.push_str(&"─".repeat(inner_width + 2));
    out.push('┘');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlld_errors::{Frame, SourceSpan, VariableError};

    #[test]
    fn renders_message_location_and_frames() {
        let error = InterpreterError::new(VariableError::UndefinedVariable { name: "x".into() })
            .at(SourceSpan::new(Some("main.mld".into()), 3, 1))
            .with_frame(Frame { description: "in /show".to_string(), location: None });
        let rendered = bordered_box(&error);
        assert!(rendered.contains("undefined variable: @x"));
        assert!(rendered.contains("main.mld:3:1"));
        assert!(rendered.contains("in /show"));
        assert!(rendered.starts_with('┌'));
    }

    #[test]
    fn import_errors_suggest_install_or_clean() {
        let error = InterpreterError::new(mlld_errors::ImportError::FileNotFound {
            path: "missing.mld".into(),
        });
        let rendered = bordered_box(&error);
        assert!(rendered.contains("mlld install"));
        assert!(rendered.contains("mlld clean"));
    }

    #[test]
    fn non_import_errors_have_no_install_hint() {
        let error = InterpreterError::new(VariableError::UndefinedVariable { name: "x".into() });
        let rendered = bordered_box(&error);
        assert!(!rendered.contains("mlld install"));
    }
}
