//! Conflict record operations.
//!
//! Conflicts are resolved in place, never deleted: resolution fills the
//! resolution columns and the row stays as the audit trail.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, not_found, Result};
use chrono::{TimeZone, Utc};
use docsync_core::model::{ConflictResolution, SyncConflict};
use rusqlite::{Connection, OptionalExtension};

/// Insert a new (open) conflict record.
pub fn insert_conflict(conn: &Connection, conflict: &SyncConflict) -> Result<()> {
    conn.execute(
        "INSERT INTO sync_conflicts
             (id, document_id, company_id, local_version_number,
              cloud_version_number, detected_at, resolution, resolved_by, resolved_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL, NULL)",
        rusqlite::params![
            conflict.id,
            conflict.document_id,
            conflict.company_id,
            conflict.local_version_number,
            conflict.cloud_version_number,
            conflict.detected_at.timestamp_millis(),
        ],
    )
    .map_err(from_rusqlite)?;

    tracing::info!(
        conflict_id = %conflict.id,
        document_id = %conflict.document_id,
        "Recorded sync conflict"
    );

    Ok(())
}

/// Fetch a conflict by id within a tenant, resolved or not.
///
/// # Errors
///
/// - `NotFound` — no such conflict, or it belongs to another tenant
pub fn fetch_conflict(conn: &Connection, conflict_id: &str, company_id: &str) -> Result<SyncConflict> {
    conn.query_row(
        &format!("{} WHERE id = ?1 AND company_id = ?2", SELECT_CONFLICT),
        [conflict_id, company_id],
        row_to_conflict,
    )
    .optional()
    .map_err(from_rusqlite)?
    .ok_or_else(|| not_found("fetch_conflict", conflict_id, "conflict"))
    .and_then(|c| c)
}

/// Fetch the open conflict for a document, if any.
pub fn fetch_open_conflict(
    conn: &Connection,
    document_id: &str,
    company_id: &str,
) -> Result<Option<SyncConflict>> {
    conn.query_row(
        &format!(
            "{} WHERE document_id = ?1 AND company_id = ?2 AND resolution IS NULL
             ORDER BY detected_at DESC LIMIT 1",
            SELECT_CONFLICT
        ),
        [document_id, company_id],
        row_to_conflict,
    )
    .optional()
    .map_err(from_rusqlite)?
    .transpose()
}

/// Mark an open conflict resolved.
///
/// # Errors
///
/// - `NotFound` — the conflict does not exist, is out of tenant scope, or
///   was already resolved (callers must not assume idempotency)
pub fn mark_resolved(
    conn: &Connection,
    conflict_id: &str,
    company_id: &str,
    resolution: ConflictResolution,
    resolved_by: &str,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE sync_conflicts
             SET resolution = ?3, resolved_by = ?4, resolved_at = ?5
             WHERE id = ?1 AND company_id = ?2 AND resolution IS NULL",
            rusqlite::params![
                conflict_id,
                company_id,
                resolution.as_str(),
                resolved_by,
                Utc::now().timestamp_millis(),
            ],
        )
        .map_err(from_rusqlite)?;

    if updated == 0 {
        return Err(not_found("mark_resolved", conflict_id, "open conflict"));
    }
    Ok(())
}

const SELECT_CONFLICT: &str = "SELECT id, document_id, company_id, local_version_number,
        cloud_version_number, detected_at, resolution, resolved_by, resolved_at
 FROM sync_conflicts";

fn row_to_conflict(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<SyncConflict>> {
    let id: String = row.get(0)?;
    let document_id: String = row.get(1)?;
    let company_id: String = row.get(2)?;
    let local_version_number: u32 = row.get(3)?;
    let cloud_version_number: u32 = row.get(4)?;
    let detected_ms: i64 = row.get(5)?;
    let resolution_text: Option<String> = row.get(6)?;
    let resolved_by: Option<String> = row.get(7)?;
    let resolved_ms: Option<i64> = row.get(8)?;

    Ok((|| {
        let resolution = resolution_text
            .as_deref()
            .map(ConflictResolution::parse)
            .transpose()?;
        Ok(SyncConflict {
            id,
            document_id,
            company_id,
            local_version_number,
            cloud_version_number,
            detected_at: Utc
                .timestamp_millis_opt(detected_ms)
                .single()
                .unwrap_or_else(Utc::now),
            resolution,
            resolved_by,
            resolved_at: resolved_ms.and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        })
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::insert_document;
    use docsync_core::errors::SyncErrorKind;
    use docsync_core::model::Document;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::migrations::apply_migrations(&mut conn).unwrap();
        insert_document(
            &conn,
            &Document {
                id: "doc:1".to_string(),
                company_id: "co:a".to_string(),
                doc_type: "cover_letter".to_string(),
                title: "Cover Letter".to_string(),
                created_at: Utc::now(),
            },
        )
        .unwrap();
        conn
    }

    fn conflict(id: &str) -> SyncConflict {
        SyncConflict {
            id: id.to_string(),
            document_id: "doc:1".to_string(),
            company_id: "co:a".to_string(),
            local_version_number: 2,
            cloud_version_number: 3,
            detected_at: Utc::now(),
            resolution: None,
            resolved_by: None,
            resolved_at: None,
        }
    }

    #[test]
    fn test_insert_and_fetch_open() {
        let conn = setup();
        insert_conflict(&conn, &conflict("conf:1")).unwrap();
        let open = fetch_open_conflict(&conn, "doc:1", "co:a").unwrap().unwrap();
        assert_eq!(open.id, "conf:1");
        assert!(open.is_open());
    }

    #[test]
    fn test_mark_resolved_closes_conflict() {
        let conn = setup();
        insert_conflict(&conn, &conflict("conf:1")).unwrap();
        mark_resolved(&conn, "conf:1", "co:a", ConflictResolution::KeepLocal, "user:1").unwrap();

        assert!(fetch_open_conflict(&conn, "doc:1", "co:a").unwrap().is_none());
        let resolved = fetch_conflict(&conn, "conf:1", "co:a").unwrap();
        assert_eq!(resolved.resolution, Some(ConflictResolution::KeepLocal));
        assert_eq!(resolved.resolved_by.as_deref(), Some("user:1"));
    }

    #[test]
    fn test_resolving_twice_is_not_found() {
        let conn = setup();
        insert_conflict(&conn, &conflict("conf:1")).unwrap();
        mark_resolved(&conn, "conf:1", "co:a", ConflictResolution::KeepCloud, "user:1").unwrap();
        let err = mark_resolved(&conn, "conf:1", "co:a", ConflictResolution::Merge, "user:1")
            .unwrap_err();
        assert_eq!(err.kind(), SyncErrorKind::NotFound);
    }

    #[test]
    fn test_cross_tenant_conflict_is_not_found() {
        let conn = setup();
        insert_conflict(&conn, &conflict("conf:1")).unwrap();
        let err = fetch_conflict(&conn, "conf:1", "co:b").unwrap_err();
        assert_eq!(err.kind(), SyncErrorKind::NotFound);
    }
}
