//! Integration tests for loading records and producing artifacts
//!
//! Covers source loading, substitution rules and output naming end to end.

use mailmerge::prelude::*;
use mailmerge::template::substitute;
use mailmerge::testing::{docx_fixture, docx_part};

#[test]
fn test_csv_short_rows_become_empty_strings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv");
    std::fs::write(&path, "id,name,email\n1,Amy,amy@example.com\n2,Bob\n").unwrap();

    let records = RecordSource::load(&path).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].get("email"), Some(&FieldValue::from("")));
    assert!(resolve_recipient(&records[1], RecipientPolicy::EmailFields).is_none());
}

#[test]
fn test_json_source_preserves_order_and_types() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.json");
    std::fs::write(
        &path,
        r#"[{"name": "Amy", "id": 7, "vip": true}, {"name": "Bob", "id": 8.5, "note": null}]"#,
    )
    .unwrap();

    let records = RecordSource::load(&path).unwrap();
    let keys: Vec<_> = records[0].iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec!["name", "id", "vip"]);

    let template = TextTemplate::new("{{name}}/{{id}}/{{vip}}/{{note}}");
    assert_eq!(template.substitute(&records[0]), "Amy/7/true/{{note}}");
    assert_eq!(template.substitute(&records[1]), "Bob/8.5/{{vip}}/");
}

#[test]
fn test_unknown_tokens_pass_through() {
    let record = Record::new(0).with("name", "Amy");
    assert_eq!(substitute("Hi {{missing}}", &record), "Hi {{missing}}");
    assert_eq!(substitute("Hi {{name}}", &record), "Hi Amy");
}

#[test]
fn test_naming_defaults() {
    assert_eq!(derive_name(&Record::new(0)), "output_output");

    let record = Record::new(0).with("id", "7").with("name", "Amy");
    assert_eq!(derive_name(&record), "7_Amy");
}

#[tokio::test]
async fn test_documents_for_every_record() {
    let dir = tempfile::tempdir().unwrap();
    let template_path = dir.path().join("template.docx");
    std::fs::write(
        &template_path,
        docx_fixture("<w:document><w:t>{{ name }} ({{ id }})</w:t></w:document>"),
    )
    .unwrap();

    let records = RecordSource::load_from_str(
        r#"[{"id": "1", "name": "Amy"}, {"id": "2", "name": "Bob"}, {"id": "3"}]"#,
        SourceFormat::Json,
    )
    .unwrap();

    let output = dir.path().join("output");
    let report = MergeBatch::new(MergeEngine::new(&output), Template::load(&template_path).unwrap())
        .run(&records)
        .await;

    assert_eq!(report.succeeded(), 2);
    assert!(matches!(report.results[2].error(), Some(MergeError::Render { index: 2, .. })));

    let amy = std::fs::read(output.join("1_Amy.docx")).unwrap();
    assert!(docx_part(&amy, "word/document.xml").unwrap().contains("Amy (1)"));
    assert!(output.join("2_Bob.docx").is_file());
    assert!(!output.join("3_output.docx").exists());
}

#[test]
fn test_missing_inputs_abort_before_processing() {
    assert!(matches!(
        RecordSource::load("/no/such/data.json"),
        Err(MergeError::SourceNotFound(_))
    ));
    assert!(matches!(
        Template::load("/no/such/template.docx"),
        Err(MergeError::TemplateNotFound(_))
    ));
}
