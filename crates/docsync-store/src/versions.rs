//! Append-only version ledger operations.
//!
//! Rows are immutable once inserted. The current version of a document is
//! always the derived `max(version_number)`; there is no maintained head
//! pointer that could drift from the ledger.

#![allow(clippy::result_large_err)]

use crate::errors::{column_decode, from_rusqlite, not_found, Result};
use chrono::{TimeZone, Utc};
use docsync_core::diff::DiffSummary;
use docsync_core::model::{DocumentSource, Version};
use docsync_core::value::Snapshot;
use rusqlite::{Connection, OptionalExtension};

/// Insert a version row.
///
/// The `UNIQUE (document_id, version_number)` constraint makes this the
/// atomic step of version-number assignment: two writers racing for the
/// same number cannot both succeed.
///
/// # Errors
///
/// - `Concurrency` — another writer claimed this version number first
/// - `Persistence` — SQLite write failed
pub fn insert_version(conn: &Connection, version: &Version) -> Result<()> {
    let diff_summary_json = match &version.diff_summary {
        Some(summary) => Some(serde_json::to_string(summary)?),
        None => None,
    };
    conn.execute(
        "INSERT INTO document_versions
             (id, document_id, company_id, version_number, source,
              snapshot, diff_summary, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            version.id,
            version.document_id,
            version.company_id,
            version.version_number,
            version.source.as_str(),
            version.snapshot.to_json_string(),
            diff_summary_json,
            version.created_by,
            version.created_at.timestamp_millis(),
        ],
    )
    .map_err(from_rusqlite)?;

    tracing::debug!(
        document_id = %version.document_id,
        version_number = version.version_number,
        source = %version.source,
        "Inserted version"
    );

    Ok(())
}

/// Current maximum version number for a document, 0 if none exist.
pub fn max_version_number(conn: &Connection, document_id: &str, company_id: &str) -> Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version_number), 0) FROM document_versions
         WHERE document_id = ?1 AND company_id = ?2",
        [document_id, company_id],
        |row| row.get::<_, u32>(0),
    )
    .map_err(from_rusqlite)
}

/// Fetch the latest version of a document within a tenant.
///
/// # Errors
///
/// - `NotFound` — the document has no versions, or is out of tenant scope
pub fn fetch_latest_version(
    conn: &Connection,
    document_id: &str,
    company_id: &str,
) -> Result<Version> {
    conn.query_row(
        &format!("{} WHERE document_id = ?1 AND company_id = ?2 ORDER BY version_number DESC LIMIT 1", SELECT_VERSION),
        [document_id, company_id],
        row_to_raw,
    )
    .optional()
    .map_err(from_rusqlite)?
    .ok_or_else(|| not_found("fetch_latest_version", document_id, "document version"))
    .and_then(raw_to_version)
}

/// Fetch a specific version of a document by number.
pub fn fetch_version_by_number(
    conn: &Connection,
    document_id: &str,
    company_id: &str,
    version_number: u32,
) -> Result<Version> {
    conn.query_row(
        &format!(
            "{} WHERE document_id = ?1 AND company_id = ?2 AND version_number = ?3",
            SELECT_VERSION
        ),
        rusqlite::params![document_id, company_id, version_number],
        row_to_raw,
    )
    .optional()
    .map_err(from_rusqlite)?
    .ok_or_else(|| not_found("fetch_version_by_number", document_id, "document version"))
    .and_then(raw_to_version)
}

/// Fetch a version row by its id within a tenant.
pub fn fetch_version(conn: &Connection, version_id: &str, company_id: &str) -> Result<Version> {
    conn.query_row(
        &format!("{} WHERE id = ?1 AND company_id = ?2", SELECT_VERSION),
        [version_id, company_id],
        row_to_raw,
    )
    .optional()
    .map_err(from_rusqlite)?
    .ok_or_else(|| not_found("fetch_version", version_id, "version"))
    .and_then(raw_to_version)
}

/// Version history for a document, newest first, bounded by `limit`.
pub fn fetch_history(
    conn: &Connection,
    document_id: &str,
    company_id: &str,
    limit: u32,
) -> Result<Vec<Version>> {
    let mut stmt = conn
        .prepare(&format!(
            "{} WHERE document_id = ?1 AND company_id = ?2
             ORDER BY version_number DESC LIMIT ?3",
            SELECT_VERSION
        ))
        .map_err(from_rusqlite)?;
    let rows: std::result::Result<Vec<_>, _> = stmt
        .query_map(
            rusqlite::params![document_id, company_id, limit],
            row_to_raw,
        )
        .map_err(from_rusqlite)?
        .collect();
    rows.map_err(from_rusqlite)?
        .into_iter()
        .map(raw_to_version)
        .collect()
}

/// Latest version of every document in a tenant, excluding one document.
///
/// Used for cascade target discovery: the caller filters on the snapshot's
/// declared doc type.
pub fn fetch_latest_versions_excluding(
    conn: &Connection,
    company_id: &str,
    exclude_document_id: &str,
) -> Result<Vec<Version>> {
    let mut stmt = conn
        .prepare(&format!(
            "{} WHERE company_id = ?1 AND document_id != ?2
               AND version_number = (
                   SELECT MAX(v2.version_number) FROM document_versions v2
                   WHERE v2.document_id = document_versions.document_id)
             ORDER BY document_id",
            SELECT_VERSION
        ))
        .map_err(from_rusqlite)?;
    let rows: std::result::Result<Vec<_>, _> = stmt
        .query_map([company_id, exclude_document_id], row_to_raw)
        .map_err(from_rusqlite)?
        .collect();
    rows.map_err(from_rusqlite)?
        .into_iter()
        .map(raw_to_version)
        .collect()
}

const SELECT_VERSION: &str = "SELECT id, document_id, company_id, version_number, source,
        snapshot, diff_summary, created_by, created_at
 FROM document_versions";

/// Intermediate row shape before JSON columns are decoded.
struct RawVersion {
    id: String,
    document_id: String,
    company_id: String,
    version_number: u32,
    source: String,
    snapshot: String,
    diff_summary: Option<String>,
    created_by: Option<String>,
    created_at_ms: i64,
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawVersion> {
    Ok(RawVersion {
        id: row.get(0)?,
        document_id: row.get(1)?,
        company_id: row.get(2)?,
        version_number: row.get(3)?,
        source: row.get(4)?,
        snapshot: row.get(5)?,
        diff_summary: row.get(6)?,
        created_by: row.get(7)?,
        created_at_ms: row.get(8)?,
    })
}

fn raw_to_version(raw: RawVersion) -> Result<Version> {
    let source = DocumentSource::parse(&raw.source)?;
    // A snapshot column that fails to parse degrades to an empty snapshot:
    // diff output is advisory and must not block reads.
    let snapshot = Snapshot::from_json_str(&raw.snapshot).unwrap_or_else(|e| {
        tracing::warn!(
            version_id = %raw.id,
            error = %e,
            "Malformed stored snapshot; degrading to empty"
        );
        Snapshot::empty()
    });
    let diff_summary: Option<DiffSummary> = match &raw.diff_summary {
        Some(json) => Some(
            serde_json::from_str(json)
                .map_err(|e| column_decode("raw_to_version", &raw.id, e))?,
        ),
        None => None,
    };
    Ok(Version {
        id: raw.id,
        document_id: raw.document_id,
        company_id: raw.company_id,
        version_number: raw.version_number,
        source,
        snapshot,
        diff_summary,
        created_by: raw.created_by,
        created_at: Utc
            .timestamp_millis_opt(raw.created_at_ms)
            .single()
            .unwrap_or_else(Utc::now),
    })
}
