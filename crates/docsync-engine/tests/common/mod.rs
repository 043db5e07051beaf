//! Shared setup helpers for engine integration tests.
//!
//! All suites run against a real SQLite database (in a TempDir when file
//! semantics matter, in memory otherwise).

#![allow(dead_code)]

use chrono::Utc;
use docsync_core::model::{CoordinationRule, Document, DocumentSource};
use docsync_core::transform::TransformKind;
use docsync_core::value::Snapshot;
use docsync_core_types::RequestContext;
use docsync_engine::commands::version::append_version;
use docsync_store::{documents, rules};
use rusqlite::Connection;

pub fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    docsync_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}

pub fn ctx(company: &str) -> RequestContext {
    RequestContext::new("user:test", company)
}

pub fn create_document(conn: &Connection, id: &str, company: &str, doc_type: &str, title: &str) {
    documents::insert_document(
        conn,
        &Document {
            id: id.to_string(),
            company_id: company.to_string(),
            doc_type: doc_type.to_string(),
            title: title.to_string(),
            created_at: Utc::now(),
        },
    )
    .unwrap();
}

pub fn append_json(
    conn: &Connection,
    document_id: &str,
    company: &str,
    source: DocumentSource,
    json: &str,
) -> docsync_core::model::Version {
    append_version(
        conn,
        document_id,
        company,
        source,
        Snapshot::from_json_str(json).unwrap(),
        &ctx(company),
    )
    .unwrap()
}

pub fn create_rule(conn: &Connection, id: &str, company: &str, transform: TransformKind) {
    rules::insert_rule(
        conn,
        &CoordinationRule {
            id: id.to_string(),
            company_id: company.to_string(),
            source_doc_type: "cover_letter".to_string(),
            source_field_path: "contract.value".to_string(),
            target_doc_type: "cost_summary".to_string(),
            target_field_path: "summary.total".to_string(),
            transform_type: transform,
            description: Some("Mirror contract value into cost summaries".to_string()),
            is_active: true,
            created_at: Utc::now(),
        },
    )
    .unwrap();
}

pub fn version_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM document_versions", [], |r| r.get(0))
        .unwrap()
}
