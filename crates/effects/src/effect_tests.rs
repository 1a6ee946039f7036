use super::*;

#[test]
fn show_effect_fields_report_length() {
    let effect = Effect::Show {
        text: "hello".into(),
    };
    assert_eq!(effect.name(), "show");
    assert_eq!(effect.fields(), vec![("len", "5".to_string())]);
}

#[test]
fn write_effect_reports_format_or_none() {
    let effect = Effect::Write {
        path: "out.json".into(),
        bytes: vec![1, 2, 3],
        format: Some(WriteFormat::Json),
    };
    let fields = effect.fields();
    assert!(fields.contains(&("path", "out.json".to_string())));
    assert!(fields.contains(&("format", "Json".to_string())));
}
