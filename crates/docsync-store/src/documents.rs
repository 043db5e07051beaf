//! Document registry operations.
//!
//! Documents are created by the authoring layer and never deleted by this
//! subsystem. The registry is the tenant-isolation anchor: every version
//! write checks membership here first.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, not_found, Result};
use chrono::{TimeZone, Utc};
use docsync_core::model::Document;
use rusqlite::{Connection, OptionalExtension};

/// Insert a document into the registry.
pub fn insert_document(conn: &Connection, document: &Document) -> Result<()> {
    conn.execute(
        "INSERT INTO documents (id, company_id, doc_type, title, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            document.id,
            document.company_id,
            document.doc_type,
            document.title,
            document.created_at.timestamp_millis(),
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

/// Fetch a document by id within a tenant.
///
/// # Errors
///
/// - `NotFound` — no such document, or it belongs to another tenant
/// - `Persistence` — SQLite read failed
pub fn fetch_document(conn: &Connection, document_id: &str, company_id: &str) -> Result<Document> {
    conn.query_row(
        "SELECT id, company_id, doc_type, title, created_at
         FROM documents WHERE id = ?1 AND company_id = ?2",
        [document_id, company_id],
        row_to_document,
    )
    .optional()
    .map_err(from_rusqlite)?
    .ok_or_else(|| not_found("fetch_document", document_id, "document"))
}

/// List a tenant's documents, oldest first.
pub fn list_documents(conn: &Connection, company_id: &str) -> Result<Vec<Document>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, company_id, doc_type, title, created_at
             FROM documents WHERE company_id = ?1
             ORDER BY created_at, id",
        )
        .map_err(from_rusqlite)?;
    let result: std::result::Result<Vec<_>, _> = stmt
        .query_map([company_id], row_to_document)
        .map_err(from_rusqlite)?
        .collect();
    result.map_err(from_rusqlite)
}

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    let created_at_ms: i64 = row.get(4)?;
    Ok(Document {
        id: row.get(0)?,
        company_id: row.get(1)?,
        doc_type: row.get(2)?,
        title: row.get(3)?,
        created_at: Utc
            .timestamp_millis_opt(created_at_ms)
            .single()
            .unwrap_or_else(Utc::now),
    })
}
