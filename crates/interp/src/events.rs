//! The streaming SDK variant (§6.3): the same event kinds the teacher's
//! `daemon/src/event_bus.rs` broadcasts (`command:start`, `command:end`,
//! ...), carried over a `tokio::sync::mpsc` channel instead. The evaluator
//! itself is `Rc`-based and not `Send` (§3.2 arena), so there is no
//! cross-thread producer task here — the caller supplies the sender
//! up front, `process_program` forwards every effect to it as evaluation
//! proceeds on the caller's own task, exactly like handing a logger a
//! `Sender` rather than returning a `Receiver` from a spawned thread.

use mlld_effects::{Effect, EffectSink};
use tokio::sync::mpsc::UnboundedSender;

/// One item of the streaming SDK variant. `Effect` carries `command:start`/
/// `command:end`/`state:write` style payloads (see `mlld_effects::Effect`'s
/// variants); `Completed` is the terminal `completion` event.
#[derive(Debug, Clone)]
pub enum InterpEvent {
    Effect(Effect),
    PipelineStage { stage: usize, total: usize, attempt: u32 },
    Completed { exit_code: i32 },
}

/// Forwards every emitted effect to an `mpsc` sender in addition to (not
/// instead of) recording it in `inner`, so the final `ProcessOutput` is
/// still built the normal way once evaluation finishes.
pub struct ChannelSink<S: EffectSink> {
    inner: S,
    sender: UnboundedSender<InterpEvent>,
}

impl<S: EffectSink> ChannelSink<S> {
    pub fn new(inner: S, sender: UnboundedSender<InterpEvent>) -> Self {
        Self { inner, sender }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EffectSink> EffectSink for ChannelSink<S> {
    fn emit(&mut self, effect: Effect) {
        // A dropped receiver just means nobody's listening to the stream
        // anymore; evaluation itself must not fail because of that.
        let _ = self.sender.send(InterpEvent::Effect(effect.clone()));
        self.inner.emit(effect);
    }

    fn rendered_text(&self) -> Option<String> {
        self.inner.rendered_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlld_effects::InMemorySink;

    #[tokio::test]
    async fn forwards_effects_to_the_channel_and_the_inner_sink() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sink = ChannelSink::new(InMemorySink::new(), tx);
        sink.emit(Effect::Show { text: "hi".to_string() });

        let received = rx.try_recv().expect("event should be forwarded");
        match received {
            InterpEvent::Effect(Effect::Show { text }) => assert_eq!(text, "hi"),
            _ => panic!("expected a Show effect"),
        }
        assert_eq!(sink.into_inner().shown_text(), "hi");
    }
}
