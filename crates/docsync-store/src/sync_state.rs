//! Per-document sync state operations.
//!
//! One row per document. `pending_source` remembers which editing surface
//! has an unreconciled edit in flight while the status is `syncing`; the
//! tracker uses it to detect divergent edits.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use chrono::{DateTime, TimeZone, Utc};
use docsync_core::model::{DocumentSource, SyncStatus};
use rusqlite::{Connection, OptionalExtension};

/// Persistent sync state row for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStateRow {
    pub document_id: String,
    pub company_id: String,
    /// External provider identifier (e.g. "google_drive"), None when the
    /// document is not connected to an external editing tool
    pub external_provider: Option<String>,
    pub sync_status: SyncStatus,
    /// Source of the edit currently awaiting reconciliation
    pub pending_source: Option<DocumentSource>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_source_edit_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Create the sync state row for a document (status idle).
pub fn init_sync_state(
    conn: &Connection,
    document_id: &str,
    company_id: &str,
    external_provider: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO document_sync_state
             (document_id, company_id, external_provider, sync_status, updated_at)
         VALUES (?1, ?2, ?3, 'idle', ?4)",
        rusqlite::params![
            document_id,
            company_id,
            external_provider,
            Utc::now().timestamp_millis(),
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

/// Fetch the sync state for a document, None when sync was never configured.
pub fn fetch_sync_state(
    conn: &Connection,
    document_id: &str,
    company_id: &str,
) -> Result<Option<SyncStateRow>> {
    conn.query_row(
        "SELECT document_id, company_id, external_provider, sync_status,
                pending_source, last_sync_at, last_source_edit_at, updated_at
         FROM document_sync_state
         WHERE document_id = ?1 AND company_id = ?2",
        [document_id, company_id],
        row_to_state,
    )
    .optional()
    .map_err(from_rusqlite)?
    .transpose()
}

/// Set the sync status, optionally recording the pending source.
///
/// `pending_source` is cleared whenever the status leaves `syncing`.
pub fn set_status(
    conn: &Connection,
    document_id: &str,
    company_id: &str,
    status: SyncStatus,
    pending_source: Option<DocumentSource>,
) -> Result<()> {
    let now = Utc::now().timestamp_millis();
    let synced_at = if status == SyncStatus::Synced {
        Some(now)
    } else {
        None
    };
    conn.execute(
        "UPDATE document_sync_state
         SET sync_status = ?3,
             pending_source = ?4,
             last_sync_at = COALESCE(?5, last_sync_at),
             updated_at = ?6
         WHERE document_id = ?1 AND company_id = ?2",
        rusqlite::params![
            document_id,
            company_id,
            status.as_str(),
            pending_source.map(|s| s.as_str()),
            synced_at,
            now,
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

/// Record that an edit from some source just landed.
pub fn touch_source_edit(conn: &Connection, document_id: &str, company_id: &str) -> Result<()> {
    let now = Utc::now().timestamp_millis();
    conn.execute(
        "UPDATE document_sync_state
         SET last_source_edit_at = ?3, updated_at = ?3
         WHERE document_id = ?1 AND company_id = ?2",
        rusqlite::params![document_id, company_id, now],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

fn row_to_state(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<SyncStateRow>> {
    let status_text: String = row.get(3)?;
    let pending_text: Option<String> = row.get(4)?;
    let last_sync_ms: Option<i64> = row.get(5)?;
    let last_edit_ms: Option<i64> = row.get(6)?;
    let updated_ms: i64 = row.get(7)?;

    let document_id: String = row.get(0)?;
    let company_id: String = row.get(1)?;
    let external_provider: Option<String> = row.get(2)?;

    Ok((|| {
        let sync_status = SyncStatus::parse(&status_text)?;
        let pending_source = pending_text
            .as_deref()
            .map(DocumentSource::parse)
            .transpose()?;
        Ok(SyncStateRow {
            document_id,
            company_id,
            external_provider,
            sync_status,
            pending_source,
            last_sync_at: last_sync_ms.and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            last_source_edit_at: last_edit_ms.and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            updated_at: Utc
                .timestamp_millis_opt(updated_ms)
                .single()
                .unwrap_or_else(Utc::now),
        })
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::insert_document;
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

    #[test]
    fn test_init_and_fetch() {
        let conn = setup();
        init_sync_state(&conn, "doc:1", "co:a", Some("google_drive")).unwrap();
        let state = fetch_sync_state(&conn, "doc:1", "co:a").unwrap().unwrap();
        assert_eq!(state.sync_status, SyncStatus::Idle);
        assert_eq!(state.external_provider.as_deref(), Some("google_drive"));
        assert!(state.pending_source.is_none());
    }

    #[test]
    fn test_fetch_missing_is_none() {
        let conn = setup();
        assert!(fetch_sync_state(&conn, "doc:1", "co:a").unwrap().is_none());
    }

    #[test]
    fn test_status_transitions() {
        let conn = setup();
        init_sync_state(&conn, "doc:1", "co:a", Some("onedrive")).unwrap();

        set_status(
            &conn,
            "doc:1",
            "co:a",
            SyncStatus::Syncing,
            Some(DocumentSource::WordOnline),
        )
        .unwrap();
        let state = fetch_sync_state(&conn, "doc:1", "co:a").unwrap().unwrap();
        assert_eq!(state.sync_status, SyncStatus::Syncing);
        assert_eq!(state.pending_source, Some(DocumentSource::WordOnline));

        set_status(&conn, "doc:1", "co:a", SyncStatus::Synced, None).unwrap();
        let state = fetch_sync_state(&conn, "doc:1", "co:a").unwrap().unwrap();
        assert_eq!(state.sync_status, SyncStatus::Synced);
        assert!(state.pending_source.is_none());
        assert!(state.last_sync_at.is_some());
    }

    #[test]
    fn test_cross_tenant_state_is_invisible() {
        let conn = setup();
        init_sync_state(&conn, "doc:1", "co:a", None).unwrap();
        assert!(fetch_sync_state(&conn, "doc:1", "co:b").unwrap().is_none());
    }
}
