//! Rule authoring operations.
//!
//! Rules are authored by the collaboration layer; these commands validate
//! and persist them so execution/preview only ever sees well-formed rules.

#![allow(clippy::result_large_err)]

use crate::audit::AuditSink;
use docsync_core::errors::Result;
use docsync_core::model::CoordinationRule;
use docsync_core_types::RequestContext;
use docsync_store::rules;
use rusqlite::Connection;
use serde_json::json;

/// Validate and persist a new coordination rule.
///
/// # Errors
///
/// - `InvalidInput` / `InvalidFieldPath` — the rule fails validation
/// - `Persistence` — SQLite write failed
pub fn create_rule(
    conn: &Connection,
    rule: &CoordinationRule,
    ctx: &RequestContext,
    audit: &dyn AuditSink,
) -> Result<()> {
    rule.validate()?;
    rules::insert_rule(conn, rule)?;

    audit.record(
        "coordination_rule_created",
        "coordination_rule",
        &rule.id,
        &ctx.user_id,
        json!({
            "source": format!("{}.{}", rule.source_doc_type, rule.source_field_path),
            "target": format!("{}.{}", rule.target_doc_type, rule.target_field_path),
            "transform_type": rule.transform_type.as_str(),
        }),
    );

    Ok(())
}

/// Soft-disable a rule. Inactive rules never load for execution or preview.
///
/// # Errors
///
/// - `NotFound` — no such rule in this tenant
pub fn deactivate_rule(
    conn: &Connection,
    rule_id: &str,
    company_id: &str,
    ctx: &RequestContext,
    audit: &dyn AuditSink,
) -> Result<()> {
    rules::set_rule_active(conn, rule_id, company_id, false)?;

    audit.record(
        "coordination_rule_deactivated",
        "coordination_rule",
        rule_id,
        &ctx.user_id,
        json!({}),
    );

    Ok(())
}
