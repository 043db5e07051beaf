//! Version append and history orchestration.
//!
//! ## Append pipeline (in order):
//! 1. Tenant check against the documents registry (NotFound, never Forbidden)
//! 2. Read current max version number
//! 3. Compute diff summary against the predecessor (none for version 1)
//! 4. Conditional insert on `UNIQUE(document_id, version_number)`
//! 5. On a lost race, re-read the max and retry (bounded attempts)
//! 6. Reclassify sync status; divergent edits raise a conflict

#![allow(clippy::result_large_err)]

use chrono::Utc;
use docsync_core::diff::{snapshot_diff, summarize, DiffResult};
use docsync_core::errors::{Result, SyncError, SyncErrorKind};
use docsync_core::model::{DocumentSource, SyncConflict, SyncStatus, Version};
use docsync_core::value::Snapshot;
use docsync_core_types::RequestContext;
use docsync_store::{conflicts, documents, sync_state, versions};
use rusqlite::Connection;

/// Bounded retries for a losing appender. Every lost race implies another
/// writer's success, so the sequence always advances.
const MAX_APPEND_ATTEMPTS: u32 = 10;

/// Append a new immutable version for a document.
///
/// Version numbers are assigned as max+1 (1 when no versions exist); the
/// ledger's uniqueness constraint is the atomic commit step, so two
/// concurrent appenders can never share a number; the loser retries with a
/// fresh max read.
///
/// # Errors
///
/// - `NotFound` — the document does not exist in this tenant
/// - `Concurrency` — lost the version-number race `MAX_APPEND_ATTEMPTS` times
/// - `Persistence` — SQLite failure
pub fn append_version(
    conn: &Connection,
    document_id: &str,
    company_id: &str,
    source: DocumentSource,
    snapshot: Snapshot,
    ctx: &RequestContext,
) -> Result<Version> {
    // Tenant isolation is enforced here, not only at the edge
    documents::fetch_document(conn, document_id, company_id)?;

    let mut last_err: Option<SyncError> = None;

    for _attempt in 0..MAX_APPEND_ATTEMPTS {
        let current_max = versions::max_version_number(conn, document_id, company_id)?;
        let next_number = current_max + 1;

        let diff_summary = if current_max == 0 {
            None
        } else {
            let previous = versions::fetch_latest_version(conn, document_id, company_id)?;
            let diff = snapshot_diff(&previous.snapshot, &snapshot);
            Some(summarize(&diff, &previous.snapshot, &snapshot))
        };

        let version = Version {
            id: uuid::Uuid::now_v7().to_string(),
            document_id: document_id.to_string(),
            company_id: company_id.to_string(),
            version_number: next_number,
            source,
            snapshot: snapshot.clone(),
            diff_summary,
            created_by: Some(ctx.user_id.clone()),
            created_at: Utc::now(),
        };

        match versions::insert_version(conn, &version) {
            Ok(()) => {
                tracing::info!(
                    document_id = %document_id,
                    version_number = next_number,
                    source = %source,
                    "Appended version"
                );
                observe_version(conn, &version)?;
                return Ok(version);
            }
            Err(e) if e.kind() == SyncErrorKind::Concurrency => {
                tracing::debug!(
                    document_id = %document_id,
                    version_number = next_number,
                    "Lost version-number race; retrying"
                );
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        SyncError::new(SyncErrorKind::Concurrency)
            .with_op("append_version")
            .with_entity_id(document_id)
            .with_message("exhausted version append retries")
    }))
}

/// Latest version of a document.
pub fn latest_version(conn: &Connection, document_id: &str, company_id: &str) -> Result<Version> {
    versions::fetch_latest_version(conn, document_id, company_id)
}

/// Version history, newest first. Finite, not restartable.
pub fn version_history(
    conn: &Connection,
    document_id: &str,
    company_id: &str,
    limit: u32,
) -> Result<Vec<Version>> {
    versions::fetch_history(conn, document_id, company_id, limit)
}

/// Structured diff between two stored versions of the same document.
///
/// Read-only and side-effect-free. Version A is treated as the older side.
///
/// # Errors
///
/// - `NotFound` — either version id is absent or out of tenant scope
/// - `InvalidInput` — the versions belong to different documents
pub fn version_diff(
    conn: &Connection,
    version_id_a: &str,
    version_id_b: &str,
    company_id: &str,
) -> Result<DiffResult> {
    let a = versions::fetch_version(conn, version_id_a, company_id)?;
    let b = versions::fetch_version(conn, version_id_b, company_id)?;

    if a.document_id != b.document_id {
        return Err(SyncError::new(SyncErrorKind::InvalidInput)
            .with_op("version_diff")
            .with_message(format!(
                "versions belong to different documents ({} vs {})",
                a.document_id, b.document_id
            )));
    }

    Ok(snapshot_diff(&a.snapshot, &b.snapshot))
}

/// Reclassify sync status after a version lands; raise a conflict when the
/// new version diverges from an unreconciled pending edit.
///
/// A conflict means: the state was `syncing` on behalf of source Y, and a
/// version from source X ≠ Y arrived before Y's edit was reconciled.
fn observe_version(conn: &Connection, version: &Version) -> Result<()> {
    let state = match sync_state::fetch_sync_state(conn, &version.document_id, &version.company_id)?
    {
        Some(state) => state,
        // Sync never configured; nothing to track
        None => return Ok(()),
    };

    sync_state::touch_source_edit(conn, &version.document_id, &version.company_id)?;

    if state.sync_status != SyncStatus::Syncing {
        return Ok(());
    }
    let pending = match state.pending_source {
        Some(pending) if pending != version.source => pending,
        _ => return Ok(()),
    };

    // Divergent edit: the in-flight side and the new version disagree.
    // The competing reference for the pending side is the last version it
    // produced before this one arrived.
    let (local_number, cloud_number) = if version.source.is_external() {
        (version.version_number.saturating_sub(1), version.version_number)
    } else {
        (version.version_number, version.version_number.saturating_sub(1))
    };

    let conflict = SyncConflict {
        id: uuid::Uuid::now_v7().to_string(),
        document_id: version.document_id.clone(),
        company_id: version.company_id.clone(),
        local_version_number: local_number.max(1),
        cloud_version_number: cloud_number.max(1),
        detected_at: Utc::now(),
        resolution: None,
        resolved_by: None,
        resolved_at: None,
    };
    conflicts::insert_conflict(conn, &conflict)?;
    sync_state::set_status(
        conn,
        &version.document_id,
        &version.company_id,
        SyncStatus::Conflict,
        None,
    )?;

    tracing::warn!(
        document_id = %version.document_id,
        conflict_id = %conflict.id,
        new_source = %version.source,
        pending_source = %pending,
        "Divergent edits detected"
    );

    Ok(())
}
