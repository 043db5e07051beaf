//! Integration tests for cascade preview: identical discovery and transform
//! to execution, but strictly read-only.

mod common;

use common::{append_json, create_document, create_rule, setup, version_count};
use docsync_core::errors::SyncErrorKind;
use docsync_core::model::DocumentSource;
use docsync_core::transform::TransformKind;
use docsync_core::value::FieldValue;
use docsync_engine::commands::coordination::preview_cascade;

fn seeded() -> rusqlite::Connection {
    let conn = setup();
    create_document(&conn, "doc:d1", "co:c1", "cover_letter", "Cover Letter");
    create_document(&conn, "doc:d2", "co:c1", "cost_summary", "Cost Summary");
    create_rule(&conn, "rule:r1", "co:c1", TransformKind::Format);

    append_json(
        &conn,
        "doc:d1",
        "co:c1",
        DocumentSource::Native,
        r#"{"doc_type": "cover_letter", "contract": {"value": 500000}}"#,
    );
    append_json(
        &conn,
        "doc:d2",
        "co:c1",
        DocumentSource::Native,
        r#"{"doc_type": "cost_summary", "title": "Cost Summary", "summary": {"total": "$0"}}"#,
    );
    conn
}

#[test]
fn test_preview_reports_would_be_changes() {
    let conn = seeded();
    let items = preview_cascade(
        &conn,
        "rule:r1",
        "co:c1",
        &FieldValue::Number(750000.0),
    )
    .unwrap();

    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.document_id, "doc:d2");
    assert_eq!(item.document_title, "Cost Summary");
    assert_eq!(item.target_field_path, "summary.total");
    assert_eq!(item.current_value, Some(FieldValue::Text("$0".to_string())));
    assert_eq!(item.new_value, FieldValue::Text("$750,000".to_string()));
}

#[test]
fn test_preview_performs_zero_writes() {
    let conn = seeded();
    let versions_before = version_count(&conn);
    let log_before: i64 = conn
        .query_row("SELECT COUNT(*) FROM coordination_log", [], |r| r.get(0))
        .unwrap();

    preview_cascade(&conn, "rule:r1", "co:c1", &FieldValue::Number(1.0)).unwrap();

    let versions_after = version_count(&conn);
    let log_after: i64 = conn
        .query_row("SELECT COUNT(*) FROM coordination_log", [], |r| r.get(0))
        .unwrap();
    assert_eq!(versions_before, versions_after, "no versions appended");
    assert_eq!(log_before, log_after, "no log entry recorded");
}

#[test]
fn test_preview_with_no_targets_is_empty() {
    let conn = setup();
    create_document(&conn, "doc:d1", "co:c1", "cover_letter", "Cover Letter");
    create_rule(&conn, "rule:r1", "co:c1", TransformKind::Copy);

    let items = preview_cascade(&conn, "rule:r1", "co:c1", &FieldValue::Number(1.0)).unwrap();
    assert!(items.is_empty());
}

#[test]
fn test_preview_cross_tenant_is_not_found() {
    let conn = seeded();
    let err = preview_cascade(&conn, "rule:r1", "co:c2", &FieldValue::Number(1.0)).unwrap_err();
    assert_eq!(err.kind(), SyncErrorKind::NotFound);
}

#[test]
fn test_preview_falls_back_to_document_id_without_title() {
    let conn = setup();
    create_document(&conn, "doc:d1", "co:c1", "cover_letter", "Cover Letter");
    create_document(&conn, "doc:d2", "co:c1", "cost_summary", "Cost Summary");
    create_rule(&conn, "rule:r1", "co:c1", TransformKind::Copy);
    append_json(
        &conn,
        "doc:d2",
        "co:c1",
        DocumentSource::Native,
        r#"{"doc_type": "cost_summary"}"#,
    );

    let items = preview_cascade(&conn, "rule:r1", "co:c1", &FieldValue::Number(1.0)).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].document_title, "doc:d2");
    assert!(items[0].current_value.is_none(), "absent target field");
}
