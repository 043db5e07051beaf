//! Integration tests for version appending and history.

mod common;

use common::{append_json, create_document, ctx, setup};
use docsync_core::errors::SyncErrorKind;
use docsync_core::model::DocumentSource;
use docsync_core::value::Snapshot;
use docsync_engine::commands::version::{
    append_version, latest_version, version_diff, version_history,
};

#[test]
fn test_version_numbers_start_at_one_and_increase() {
    let conn = setup();
    create_document(&conn, "doc:1", "co:a", "cover_letter", "Cover Letter");

    let v1 = append_json(&conn, "doc:1", "co:a", DocumentSource::Native, r#"{"a": 1}"#);
    let v2 = append_json(&conn, "doc:1", "co:a", DocumentSource::Native, r#"{"a": 2}"#);
    let v3 = append_json(&conn, "doc:1", "co:a", DocumentSource::Native, r#"{"a": 3}"#);

    assert_eq!(v1.version_number, 1);
    assert_eq!(v2.version_number, 2);
    assert_eq!(v3.version_number, 3);
    assert!(v1.is_initial());
}

#[test]
fn test_first_version_has_no_diff_summary() {
    let conn = setup();
    create_document(&conn, "doc:1", "co:a", "cover_letter", "Cover Letter");

    let v1 = append_json(&conn, "doc:1", "co:a", DocumentSource::Native, r#"{"a": 1}"#);
    assert!(v1.diff_summary.is_none());

    let v2 = append_json(
        &conn,
        "doc:1",
        "co:a",
        DocumentSource::Native,
        r#"{"a": 2, "b": "new"}"#,
    );
    let summary = v2.diff_summary.expect("second version carries a summary");
    assert_eq!(summary.modifications, 1);
    assert_eq!(summary.additions, 1);
    assert_eq!(summary.deletions, 0);
    assert_eq!(summary.sections_changed, vec!["a", "b"]);
}

#[test]
fn test_append_to_unknown_document_is_not_found() {
    let conn = setup();
    let err = append_version(
        &conn,
        "doc:ghost",
        "co:a",
        DocumentSource::Native,
        Snapshot::empty(),
        &ctx("co:a"),
    )
    .unwrap_err();
    assert_eq!(err.kind(), SyncErrorKind::NotFound);
}

#[test]
fn test_tenant_isolation_on_append_and_read() {
    let conn = setup();
    create_document(&conn, "doc:1", "co:a", "cover_letter", "Cover Letter");
    append_json(&conn, "doc:1", "co:a", DocumentSource::Native, r#"{"a": 1}"#);

    // Appending into another tenant's document is NotFound, not Forbidden
    let err = append_version(
        &conn,
        "doc:1",
        "co:b",
        DocumentSource::Native,
        Snapshot::empty(),
        &ctx("co:b"),
    )
    .unwrap_err();
    assert_eq!(err.kind(), SyncErrorKind::NotFound);

    let err = latest_version(&conn, "doc:1", "co:b").unwrap_err();
    assert_eq!(err.kind(), SyncErrorKind::NotFound);
}

#[test]
fn test_history_newest_first_and_bounded() {
    let conn = setup();
    create_document(&conn, "doc:1", "co:a", "cover_letter", "Cover Letter");
    for n in 1..=6 {
        append_json(
            &conn,
            "doc:1",
            "co:a",
            DocumentSource::Native,
            &format!(r#"{{"n": {}}}"#, n),
        );
    }

    let history = version_history(&conn, "doc:1", "co:a", 4).unwrap();
    let numbers: Vec<u32> = history.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![6, 5, 4, 3]);
}

#[test]
fn test_version_diff_between_stored_versions() {
    let conn = setup();
    create_document(&conn, "doc:1", "co:a", "cover_letter", "Cover Letter");
    let v1 = append_json(
        &conn,
        "doc:1",
        "co:a",
        DocumentSource::Native,
        r#"{"contract": {"value": 400000}, "intro": "hello"}"#,
    );
    let v2 = append_json(
        &conn,
        "doc:1",
        "co:a",
        DocumentSource::Native,
        r#"{"contract": {"value": 500000}, "intro": "hello"}"#,
    );

    let diff = version_diff(&conn, &v1.id, &v2.id, "co:a").unwrap();
    assert_eq!(diff.modifications.len(), 1);
    assert_eq!(diff.modifications[0].path, "contract.value");
    assert_eq!(diff.modifications[0].content, "500000");
    assert_eq!(diff.unchanged, 1);
}

#[test]
fn test_version_diff_same_version_is_empty() {
    let conn = setup();
    create_document(&conn, "doc:1", "co:a", "cover_letter", "Cover Letter");
    let v1 = append_json(&conn, "doc:1", "co:a", DocumentSource::Native, r#"{"a": 1}"#);

    let diff = version_diff(&conn, &v1.id, &v1.id, "co:a").unwrap();
    assert!(diff.is_empty());
    assert_eq!(diff.unchanged, 1);
}

#[test]
fn test_version_diff_across_documents_rejected() {
    let conn = setup();
    create_document(&conn, "doc:1", "co:a", "cover_letter", "Cover Letter");
    create_document(&conn, "doc:2", "co:a", "cost_summary", "Cost Summary");
    let v1 = append_json(&conn, "doc:1", "co:a", DocumentSource::Native, r#"{"a": 1}"#);
    let v2 = append_json(&conn, "doc:2", "co:a", DocumentSource::Native, r#"{"a": 1}"#);

    let err = version_diff(&conn, &v1.id, &v2.id, "co:a").unwrap_err();
    assert_eq!(err.kind(), SyncErrorKind::InvalidInput);
}

#[test]
fn test_version_diff_is_read_only() {
    let conn = setup();
    create_document(&conn, "doc:1", "co:a", "cover_letter", "Cover Letter");
    let v1 = append_json(&conn, "doc:1", "co:a", DocumentSource::Native, r#"{"a": 1}"#);
    let v2 = append_json(&conn, "doc:1", "co:a", DocumentSource::Native, r#"{"a": 2}"#);

    let before = common::version_count(&conn);
    version_diff(&conn, &v1.id, &v2.id, "co:a").unwrap();
    assert_eq!(common::version_count(&conn), before);
}
