//! Coordination rule execution and preview.
//!
//! ## Execute pipeline (in order):
//! 1. Load the active rule (inactive or missing → RuleNotFound)
//! 2. Read the trigger document's latest snapshot; absent source value →
//!    one `skipped` log entry, success
//! 3. Compute the transformed value
//! 4. Discover targets: other documents in the tenant whose latest snapshot
//!    declares the target doc type; none → `skipped` log, success
//! 5. Per target: capture old value, write new value, append a version
//! 6. One log entry per attempt, whatever the outcome
//! 7. One fire-and-forget audit event
//!
//! Target writes commit independently: a failure partway leaves earlier
//! targets updated and the `failed` log entry holding the partial affected
//! list. The engine never retries; re-invocation re-applies the transform
//! to all targets.

#![allow(clippy::result_large_err)]

use crate::audit::AuditSink;
use crate::config::EngineConfig;
use chrono::Utc;
use docsync_core::errors::{Result, SyncError, SyncErrorKind};
use docsync_core::model::{
    CascadePreviewItem, CoordinationLogEntry, CoordinationRule, CoordinationStatus,
    DocumentSource, FieldChange, Version,
};
use docsync_core::value::{FieldPath, FieldValue};
use docsync_core_types::RequestContext;
use docsync_store::{coordination_log, rules, versions};
use rusqlite::Connection;
use serde_json::json;

/// Outcome of one coordination execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinationOutcome {
    pub status: CoordinationStatus,
    pub affected_documents: Vec<String>,
    pub changes_applied: Vec<FieldChange>,
    /// Id of the log entry recorded for this attempt
    pub log_id: String,
}

/// Execute a coordination rule against its current targets.
///
/// # Errors
///
/// - `NotFound` — rule missing/inactive, or trigger document out of scope
/// - `InvalidFieldPath` — the rule carries a malformed path
/// - `CascadeLimit` — target count exceeds the configured bound (no writes)
/// - `PartialCascade` — a target write failed after earlier ones committed;
///   the log entry preserves how far the cascade got
pub fn execute_coordination(
    conn: &Connection,
    rule_id: &str,
    trigger_document_id: &str,
    company_id: &str,
    ctx: &RequestContext,
    audit: &dyn AuditSink,
    config: &EngineConfig,
) -> Result<CoordinationOutcome> {
    // 1. Rule must exist, be active, and belong to this tenant
    let rule = rules::fetch_active_rule(conn, rule_id, company_id)?;
    let source_path = FieldPath::parse(&rule.source_field_path)?;
    let target_path = FieldPath::parse(&rule.target_field_path)?;

    // 2. Trigger document's latest snapshot
    let trigger = match versions::fetch_latest_version(conn, trigger_document_id, company_id) {
        Ok(version) => version,
        Err(e) if e.kind() == SyncErrorKind::NotFound => {
            write_log(
                conn,
                &rule,
                trigger_document_id,
                Vec::new(),
                Vec::new(),
                CoordinationStatus::Failed,
                Some("trigger document version not found".to_string()),
            )?;
            return Err(e);
        }
        Err(e) => {
            write_log(
                conn,
                &rule,
                trigger_document_id,
                Vec::new(),
                Vec::new(),
                CoordinationStatus::Failed,
                Some(e.message().to_string()),
            )?;
            return Err(e);
        }
    };

    let source_value = match trigger.snapshot.get_path(&source_path) {
        Some(value) => value.clone(),
        // Absence of a value is not an error: the rule does not apply yet
        None => {
            let log_id = write_log(
                conn,
                &rule,
                trigger_document_id,
                Vec::new(),
                Vec::new(),
                CoordinationStatus::Skipped,
                Some(format!(
                    "source field '{}' not present in trigger document",
                    rule.source_field_path
                )),
            )?;
            return Ok(CoordinationOutcome {
                status: CoordinationStatus::Skipped,
                affected_documents: Vec::new(),
                changes_applied: Vec::new(),
                log_id,
            });
        }
    };

    // 3. Transform is a pure function of the source value
    let transformed = rule.transform_type.apply(&source_value);

    // 4. Targets: latest snapshot of every other document in the tenant
    //    declaring the target doc type
    let targets = match discover_targets(conn, &rule, trigger_document_id, company_id) {
        Ok(targets) => targets,
        Err(e) => {
            write_log(
                conn,
                &rule,
                trigger_document_id,
                Vec::new(),
                Vec::new(),
                CoordinationStatus::Failed,
                Some(e.message().to_string()),
            )?;
            return Err(e);
        }
    };

    if targets.is_empty() {
        let log_id = write_log(
            conn,
            &rule,
            trigger_document_id,
            Vec::new(),
            Vec::new(),
            CoordinationStatus::Skipped,
            Some(format!(
                "no target documents of type '{}'",
                rule.target_doc_type
            )),
        )?;
        return Ok(CoordinationOutcome {
            status: CoordinationStatus::Skipped,
            affected_documents: Vec::new(),
            changes_applied: Vec::new(),
            log_id,
        });
    }

    // Fail fast before any write rather than iterating unbounded
    if targets.len() > config.max_cascade_targets {
        let message = format!(
            "cascade would touch {} documents, above the {} limit",
            targets.len(),
            config.max_cascade_targets
        );
        write_log(
            conn,
            &rule,
            trigger_document_id,
            Vec::new(),
            Vec::new(),
            CoordinationStatus::Failed,
            Some(message.clone()),
        )?;
        return Err(SyncError::new(SyncErrorKind::CascadeLimit)
            .with_op("execute_coordination")
            .with_entity_id(rule_id)
            .with_message(message));
    }

    // 5. Apply to each target; writes commit independently
    let mut affected: Vec<String> = Vec::new();
    let mut changes: Vec<FieldChange> = Vec::new();

    for target in &targets {
        let old_value = target.snapshot.get_path(&target_path).cloned();
        let updated = target.snapshot.set_path(&target_path, transformed.clone());

        if let Err(e) = super::version::append_version(
            conn,
            &target.document_id,
            company_id,
            DocumentSource::Native,
            updated,
            ctx,
        ) {
            let message = format!(
                "target '{}' failed after {} of {} updates: {}",
                target.document_id,
                affected.len(),
                targets.len(),
                e.message()
            );
            write_log(
                conn,
                &rule,
                trigger_document_id,
                affected.clone(),
                changes.clone(),
                CoordinationStatus::Failed,
                Some(message.clone()),
            )?;
            return Err(SyncError::new(SyncErrorKind::PartialCascade)
                .with_op("execute_coordination")
                .with_entity_id(rule_id)
                .with_message(message));
        }

        affected.push(target.document_id.clone());
        changes.push(FieldChange {
            document_id: target.document_id.clone(),
            field_path: rule.target_field_path.clone(),
            old_value,
            new_value: transformed.clone(),
        });
    }

    // 6. The applied log entry is the durable record of this cascade
    let log_id = write_log(
        conn,
        &rule,
        trigger_document_id,
        affected.clone(),
        changes.clone(),
        CoordinationStatus::Applied,
        None,
    )?;

    // 7. Fire-and-forget audit event
    audit.record(
        "coordination_execute",
        "coordination_rule",
        rule_id,
        &ctx.user_id,
        json!({
            "trigger_document_id": trigger_document_id,
            "affected_count": affected.len(),
            "transform_type": rule.transform_type.as_str(),
        }),
    );

    tracing::info!(
        rule_id = %rule_id,
        trigger_document_id = %trigger_document_id,
        affected_count = affected.len(),
        "Coordination cascade applied"
    );

    Ok(CoordinationOutcome {
        status: CoordinationStatus::Applied,
        affected_documents: affected,
        changes_applied: changes,
        log_id,
    })
}

/// Preview what a rule would change given a hypothetical source value.
///
/// Identical target discovery and transform computation to execution, but
/// performs no writes and records no log entry.
pub fn preview_cascade(
    conn: &Connection,
    rule_id: &str,
    company_id: &str,
    hypothetical_value: &FieldValue,
) -> Result<Vec<CascadePreviewItem>> {
    let rule = rules::fetch_active_rule(conn, rule_id, company_id)?;
    let target_path = FieldPath::parse(&rule.target_field_path)?;

    let transformed = rule.transform_type.apply(hypothetical_value);

    // No trigger document in a preview; nothing to exclude
    let targets = discover_targets(conn, &rule, "", company_id)?;

    Ok(targets
        .iter()
        .map(|target| CascadePreviewItem {
            rule_id: rule.id.clone(),
            rule_description: rule.description.clone(),
            target_doc_type: rule.target_doc_type.clone(),
            target_field_path: rule.target_field_path.clone(),
            document_id: target.document_id.clone(),
            document_title: target
                .snapshot
                .title()
                .map(|t| t.to_string())
                .unwrap_or_else(|| target.document_id.clone()),
            current_value: target.snapshot.get_path(&target_path).cloned(),
            new_value: transformed.clone(),
        })
        .collect())
}

/// Active rules for a tenant, newest first.
pub fn active_rules(conn: &Connection, company_id: &str) -> Result<Vec<CoordinationRule>> {
    rules::list_active_rules(conn, company_id)
}

/// Log entries for a rule, newest first.
pub fn log_for_rule(
    conn: &Connection,
    rule_id: &str,
    company_id: &str,
) -> Result<Vec<CoordinationLogEntry>> {
    coordination_log::list_for_rule(conn, rule_id, company_id)
}

/// Log entries for a trigger document, newest first.
pub fn log_for_trigger(
    conn: &Connection,
    trigger_document_id: &str,
    company_id: &str,
) -> Result<Vec<CoordinationLogEntry>> {
    coordination_log::list_for_trigger(conn, trigger_document_id, company_id)
}

/// Latest versions of documents in the tenant whose snapshot declares the
/// rule's target doc type, excluding the trigger document.
fn discover_targets(
    conn: &Connection,
    rule: &CoordinationRule,
    exclude_document_id: &str,
    company_id: &str,
) -> Result<Vec<Version>> {
    let latest = versions::fetch_latest_versions_excluding(conn, company_id, exclude_document_id)?;
    Ok(latest
        .into_iter()
        .filter(|version| version.snapshot.doc_type() == Some(rule.target_doc_type.as_str()))
        .collect())
}

/// Write the single log entry for one execution attempt.
fn write_log(
    conn: &Connection,
    rule: &CoordinationRule,
    trigger_document_id: &str,
    affected_documents: Vec<String>,
    changes_applied: Vec<FieldChange>,
    status: CoordinationStatus,
    error_message: Option<String>,
) -> Result<String> {
    let entry = CoordinationLogEntry {
        id: uuid::Uuid::now_v7().to_string(),
        rule_id: rule.id.clone(),
        trigger_document_id: trigger_document_id.to_string(),
        company_id: rule.company_id.clone(),
        affected_documents,
        changes_applied,
        status,
        error_message,
        executed_at: Utc::now(),
    };
    coordination_log::insert_entry(conn, &entry)?;
    Ok(entry.id)
}
