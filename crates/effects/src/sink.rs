//! Effect sinks (§4.8): the bus computes effects, a sink realizes them —
//! a split between pure effect computation and effect application that
//! keeps the evaluator testable without real I/O.

use crate::effect::{Effect, Stream};
use std::fs;
use std::io::Write as _;
use std::path::Path;

/// Realizes effects. The in-memory sink captures order for tests; the real
/// sink performs actual I/O.
pub trait EffectSink {
    fn emit(&mut self, effect: Effect);

    /// The sink's accumulated stdout-equivalent text, if it tracks one.
    /// `mlld_interp::process_program` reads this to build the SDK's
    /// returned string result without downcasting a trait object.
    fn rendered_text(&self) -> Option<String> {
        None
    }
}

/// Captures effects in emission order without performing I/O. Used by
/// tests and by `mlld_interp::ProcessOutput` when the caller only wants the
/// rendered text.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InMemorySink {
    pub effects: Vec<Effect>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenated text of every `Show` effect, in order — the program's
    /// final stdout-equivalent output.
    pub fn shown_text(&self) -> String {
        self.effects
            .iter()
            .filter_map(|e| match e {
                Effect::Show { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl EffectSink for InMemorySink {
    fn emit(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    fn rendered_text(&self) -> Option<String> {
        Some(self.shown_text())
    }
}

/// Writes effects to the real filesystem/streams. `Show` effects are
/// buffered into `stdout_buffer` rather than printed directly, so a single
/// program run still produces one coherent string the SDK entry point can
/// return (§6.3).
#[derive(Debug, Default)]
pub struct RealSink {
    pub stdout_buffer: String,
    pub stderr_buffer: String,
}

impl RealSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EffectSink for RealSink {
    fn emit(&mut self, effect: Effect) {
        match effect {
            Effect::Show { text } => self.stdout_buffer.push_str(&text),
            Effect::Stream { stream, text } => match stream {
                Stream::Stdout => self.stdout_buffer.push_str(&text),
                Stream::Stderr => self.stderr_buffer.push_str(&text),
            },
            Effect::Write { path, bytes, .. } => {
                if let Err(err) = write_atomic(Path::new(&path), &bytes) {
                    tracing::warn!(path = %path, error = %err, "failed to write output file");
                }
            }
            Effect::Env { name, value } => std::env::set_var(name, value),
            Effect::StateWrite { .. } => {
                // Observed by the SDK's `captureEnvironment`-style hook, not
                // realized as I/O here.
            }
        }
    }

    fn rendered_text(&self) -> Option<String> {
        Some(self.stdout_buffer.clone())
    }
}

/// Atomic replace: write to a sibling temp file, then rename (§3.4 added
/// note) — avoids leaving a half-written file behind on crash.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
