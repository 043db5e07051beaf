//! Sync lifecycle and conflict resolution.
//!
//! The external sync integration drives `begin_sync`/`complete_sync`/
//! `fail_sync`; conflicts are raised by the version append path and leave
//! only through an explicit resolution, which appends exactly one new
//! Version and never deletes history.

#![allow(clippy::result_large_err)]

use crate::audit::AuditSink;
use docsync_core::errors::{Result, SyncError, SyncErrorKind};
use docsync_core::model::{
    ArtifactStatus, ConflictResolution, DocumentSource, SyncConflict, SyncStatus, Version,
};
use docsync_core::value::Snapshot;
use docsync_core_types::RequestContext;
use docsync_store::{conflicts, documents, sync_state, versions};
use rusqlite::Connection;
use serde_json::json;

/// Configure sync for a document (status idle).
///
/// `external_provider` identifies the cloud tool this document mirrors to,
/// None for documents tracked natively only.
pub fn init_sync(
    conn: &Connection,
    document_id: &str,
    company_id: &str,
    external_provider: Option<&str>,
) -> Result<()> {
    documents::fetch_document(conn, document_id, company_id)?;
    sync_state::init_sync_state(conn, document_id, company_id, external_provider)
}

/// Mark a push/pull in flight on behalf of `pending_source`.
pub fn begin_sync(
    conn: &Connection,
    document_id: &str,
    company_id: &str,
    pending_source: DocumentSource,
) -> Result<()> {
    require_state(conn, document_id, company_id)?;
    sync_state::set_status(
        conn,
        document_id,
        company_id,
        SyncStatus::Syncing,
        Some(pending_source),
    )
}

/// Record a successful reconciliation with the external source.
pub fn complete_sync(conn: &Connection, document_id: &str, company_id: &str) -> Result<()> {
    require_state(conn, document_id, company_id)?;
    sync_state::set_status(conn, document_id, company_id, SyncStatus::Synced, None)
}

/// Record a failed sync attempt.
pub fn fail_sync(conn: &Connection, document_id: &str, company_id: &str) -> Result<()> {
    require_state(conn, document_id, company_id)?;
    sync_state::set_status(conn, document_id, company_id, SyncStatus::Error, None)
}

/// The open conflict for a document, if any.
pub fn get_conflict(
    conn: &Connection,
    document_id: &str,
    company_id: &str,
) -> Result<Option<SyncConflict>> {
    conflicts::fetch_open_conflict(conn, document_id, company_id)
}

/// Resolve an open conflict.
///
/// Appends exactly one new Version holding the chosen outcome: the
/// natively-authored side (`keep_local`), the externally-sourced side
/// (`keep_cloud`), or a caller-supplied merged snapshot (`merge`). Marks the
/// conflict resolved and returns the document to `synced` (`idle` when no
/// external provider is configured). Prior versions are never deleted.
///
/// # Errors
///
/// - `NotFound` — the conflict does not exist, is out of tenant scope, or
///   was already resolved
/// - `InvalidInput` — `merge` chosen without a merged snapshot
pub fn resolve_conflict(
    conn: &Connection,
    conflict_id: &str,
    company_id: &str,
    resolution: ConflictResolution,
    merged_snapshot: Option<Snapshot>,
    ctx: &RequestContext,
    audit: &dyn AuditSink,
) -> Result<Version> {
    let conflict = conflicts::fetch_conflict(conn, conflict_id, company_id)?;
    if !conflict.is_open() {
        return Err(SyncError::new(SyncErrorKind::NotFound)
            .with_op("resolve_conflict")
            .with_entity_id(conflict_id)
            .with_message("conflict already resolved"));
    }

    let chosen = match resolution {
        ConflictResolution::KeepLocal => {
            versions::fetch_version_by_number(
                conn,
                &conflict.document_id,
                company_id,
                conflict.local_version_number,
            )?
            .snapshot
        }
        ConflictResolution::KeepCloud => {
            versions::fetch_version_by_number(
                conn,
                &conflict.document_id,
                company_id,
                conflict.cloud_version_number,
            )?
            .snapshot
        }
        ConflictResolution::Merge => merged_snapshot.ok_or_else(|| {
            SyncError::new(SyncErrorKind::InvalidInput)
                .with_op("resolve_conflict")
                .with_entity_id(conflict_id)
                .with_message("merge resolution requires a merged snapshot")
        })?,
    };

    // The resolved snapshot is a native write; the external integration
    // pushes it back out afterwards.
    let version = super::version::append_version(
        conn,
        &conflict.document_id,
        company_id,
        DocumentSource::Native,
        chosen,
        ctx,
    )?;

    conflicts::mark_resolved(conn, conflict_id, company_id, resolution, &ctx.user_id)?;

    let resolved_status = match sync_state::fetch_sync_state(conn, &conflict.document_id, company_id)? {
        Some(state) if state.external_provider.is_some() => SyncStatus::Synced,
        _ => SyncStatus::Idle,
    };
    sync_state::set_status(
        conn,
        &conflict.document_id,
        company_id,
        resolved_status,
        None,
    )?;

    audit.record(
        "sync_conflict_resolved",
        "sync_conflict",
        conflict_id,
        &ctx.user_id,
        json!({
            "resolution": resolution.as_str(),
            "document_id": conflict.document_id,
            "version_number": version.version_number,
        }),
    );

    Ok(version)
}

/// Derived presentation status for every document in a tenant.
///
/// Combines each document's latest version (when one exists), its sync
/// status, last editor, and word count. Computed on read; nothing persists.
pub fn artifact_statuses(conn: &Connection, company_id: &str) -> Result<Vec<ArtifactStatus>> {
    let docs = documents::list_documents(conn, company_id)?;
    let mut statuses = Vec::with_capacity(docs.len());

    for doc in docs {
        let latest = match versions::fetch_latest_version(conn, &doc.id, company_id) {
            Ok(version) => Some(version),
            Err(e) if e.kind() == SyncErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        let state = sync_state::fetch_sync_state(conn, &doc.id, company_id)?;

        let volume_name = latest
            .as_ref()
            .and_then(|v| v.snapshot.title().map(|t| t.to_string()))
            .unwrap_or_else(|| doc.title.clone());

        statuses.push(ArtifactStatus {
            document_id: doc.id.clone(),
            volume_name,
            doc_type: doc.doc_type.clone(),
            sync_status: state
                .map(|s| s.sync_status)
                .unwrap_or(SyncStatus::Idle),
            latest_version_number: latest.as_ref().map(|v| v.version_number),
            last_edited_by: latest.as_ref().and_then(|v| v.created_by.clone()),
            last_edited_at: latest.as_ref().map(|v| v.created_at),
            edit_source: latest.as_ref().map(|v| v.source),
            word_count: latest
                .as_ref()
                .map(|v| v.snapshot.word_count())
                .unwrap_or(0),
        });
    }

    Ok(statuses)
}

fn require_state(conn: &Connection, document_id: &str, company_id: &str) -> Result<()> {
    match sync_state::fetch_sync_state(conn, document_id, company_id)? {
        Some(_) => Ok(()),
        None => Err(SyncError::new(SyncErrorKind::NotFound)
            .with_op("sync_state")
            .with_entity_id(document_id)
            .with_message("sync not configured for this document")),
    }
}
