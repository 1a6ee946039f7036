//! The user-visible effect taxonomy (§4.8): one struct-variant per kind,
//! with `name()`/`fields()` for structured log spans.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteFormat {
    Json,
    Md,
    Xml,
    Csv,
    Text,
    Binary,
}

/// One user-visible output action (§4.8). The bus (`EffectBus`) orders
/// these by emission time; a sink decides how to realize them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// `/show` — append to the stdout stream in program order.
    Show { text: String },
    /// `/output ... to FILE` — write to a file, optionally pre-formatted.
    Write {
        path: String,
        bytes: Vec<u8>,
        format: Option<WriteFormat>,
    },
    /// `/output ... to stdout|stderr` (or `/run` command output).
    Stream { stream: Stream, text: String },
    /// Set an environment variable for downstream shell invocations.
    Env { name: String, value: String },
    /// SDK-observable mutation of an in-memory state module.
    StateWrite { path: String, value: serde_json::Value },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Show { .. } => "show",
            Effect::Write { .. } => "write",
            Effect::Stream { .. } => "stream",
            Effect::Env { .. } => "env",
            Effect::StateWrite { .. } => "state_write",
        }
    }

    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::Show { text } => vec![("len", text.len().to_string())],
            Effect::Write { path, bytes, format } => vec![
                ("path", path.clone()),
                ("bytes", bytes.len().to_string()),
                (
                    "format",
                    format
                        .map(|f| format!("{f:?}"))
                        .unwrap_or_else(|| "none".to_string()),
                ),
            ],
            Effect::Stream { stream, text } => vec![
                ("stream", format!("{stream:?}")),
                ("len", text.len().to_string()),
            ],
            Effect::Env { name, .. } => vec![("name", name.clone())],
            Effect::StateWrite { path, .. } => vec![("path", path.clone())],
        }
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
