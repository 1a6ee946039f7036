use super::*;
use crate::effect::WriteFormat;

#[test]
fn in_memory_sink_preserves_emission_order() {
    let mut sink = InMemorySink::new();
    sink.emit(Effect::Show { text: "a".into() });
    sink.emit(Effect::Show { text: "b".into() });
    assert_eq!(sink.shown_text(), "ab");
}

#[test]
fn in_memory_sink_shown_text_ignores_non_show_effects() {
    let mut sink = InMemorySink::new();
    sink.emit(Effect::Show { text: "a".into() });
    sink.emit(Effect::Stream {
        stream: Stream::Stdout,
        text: "ignored".into(),
    });
    sink.emit(Effect::Show { text: "b".into() });
    assert_eq!(sink.shown_text(), "ab");
}

#[test]
fn real_sink_buffers_show_and_stream_separately() {
    let mut sink = RealSink::new();
    sink.emit(Effect::Show { text: "out".into() });
    sink.emit(Effect::Stream {
        stream: Stream::Stderr,
        text: "err".into(),
    });
    assert_eq!(sink.stdout_buffer, "out");
    assert_eq!(sink.stderr_buffer, "err");
}

#[test]
fn real_sink_writes_file_atomically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("out.json");
    let mut sink = RealSink::new();
    sink.emit(Effect::Write {
        path: path.to_string_lossy().into_owned(),
        bytes: b"{}".to_vec(),
        format: Some(WriteFormat::Json),
    });
    let written = std::fs::read(&path).expect("file written");
    assert_eq!(written, b"{}");
    assert!(!path.with_extension("tmp").exists());
}
