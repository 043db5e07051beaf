//! Coordination rule persistence.
//!
//! Rules are authored by the authoring layer; the engine only loads active
//! ones. Deactivation is a soft-disable.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, not_found, Result};
use chrono::{TimeZone, Utc};
use docsync_core::model::CoordinationRule;
use docsync_core::transform::TransformKind;
use rusqlite::{Connection, OptionalExtension};

/// Insert a coordination rule.
pub fn insert_rule(conn: &Connection, rule: &CoordinationRule) -> Result<()> {
    conn.execute(
        "INSERT INTO coordination_rules
             (id, company_id, source_doc_type, source_field_path,
              target_doc_type, target_field_path, transform_type,
              description, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            rule.id,
            rule.company_id,
            rule.source_doc_type,
            rule.source_field_path,
            rule.target_doc_type,
            rule.target_field_path,
            rule.transform_type.as_str(),
            rule.description,
            rule.is_active,
            rule.created_at.timestamp_millis(),
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

/// Fetch an active rule by id within a tenant.
///
/// # Errors
///
/// - `NotFound` — no such rule, it is inactive, or it belongs to another
///   tenant
pub fn fetch_active_rule(
    conn: &Connection,
    rule_id: &str,
    company_id: &str,
) -> Result<CoordinationRule> {
    conn.query_row(
        &format!(
            "{} WHERE id = ?1 AND company_id = ?2 AND is_active = 1",
            SELECT_RULE
        ),
        [rule_id, company_id],
        row_to_rule,
    )
    .optional()
    .map_err(from_rusqlite)?
    .ok_or_else(|| not_found("fetch_active_rule", rule_id, "coordination rule"))
    .and_then(|r| r)
}

/// All active rules for a tenant, newest first.
pub fn list_active_rules(conn: &Connection, company_id: &str) -> Result<Vec<CoordinationRule>> {
    let mut stmt = conn
        .prepare(&format!(
            "{} WHERE company_id = ?1 AND is_active = 1
             ORDER BY created_at DESC, id DESC",
            SELECT_RULE
        ))
        .map_err(from_rusqlite)?;
    let rows: std::result::Result<Vec<_>, _> = stmt
        .query_map([company_id], row_to_rule)
        .map_err(from_rusqlite)?
        .collect();
    rows.map_err(from_rusqlite)?.into_iter().collect()
}

/// Soft-enable or soft-disable a rule.
///
/// # Errors
///
/// - `NotFound` — no such rule in this tenant
pub fn set_rule_active(
    conn: &Connection,
    rule_id: &str,
    company_id: &str,
    is_active: bool,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE coordination_rules SET is_active = ?3
             WHERE id = ?1 AND company_id = ?2",
            rusqlite::params![rule_id, company_id, is_active],
        )
        .map_err(from_rusqlite)?;
    if updated == 0 {
        return Err(not_found("set_rule_active", rule_id, "coordination rule"));
    }
    Ok(())
}

const SELECT_RULE: &str = "SELECT id, company_id, source_doc_type, source_field_path,
        target_doc_type, target_field_path, transform_type,
        description, is_active, created_at
 FROM coordination_rules";

fn row_to_rule(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<CoordinationRule>> {
    let id: String = row.get(0)?;
    let company_id: String = row.get(1)?;
    let source_doc_type: String = row.get(2)?;
    let source_field_path: String = row.get(3)?;
    let target_doc_type: String = row.get(4)?;
    let target_field_path: String = row.get(5)?;
    let transform_text: String = row.get(6)?;
    let description: Option<String> = row.get(7)?;
    let is_active: bool = row.get(8)?;
    let created_ms: i64 = row.get(9)?;

    Ok((|| {
        let transform_type = TransformKind::parse(&transform_text)?;
        Ok(CoordinationRule {
            id,
            company_id,
            source_doc_type,
            source_field_path,
            target_doc_type,
            target_field_path,
            transform_type,
            description,
            is_active,
            created_at: Utc
                .timestamp_millis_opt(created_ms)
                .single()
                .unwrap_or_else(Utc::now),
        })
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_core::errors::SyncErrorKind;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::migrations::apply_migrations(&mut conn).unwrap();
        conn
    }

    fn rule(id: &str, company: &str, created_ms: i64) -> CoordinationRule {
        CoordinationRule {
            id: id.to_string(),
            company_id: company.to_string(),
            source_doc_type: "cover_letter".to_string(),
            source_field_path: "contract.value".to_string(),
            target_doc_type: "cost_summary".to_string(),
            target_field_path: "summary.total".to_string(),
            transform_type: TransformKind::Format,
            description: Some("Mirror contract value into cost summaries".to_string()),
            is_active: true,
            created_at: Utc.timestamp_millis_opt(created_ms).unwrap(),
        }
    }

    #[test]
    fn test_insert_and_fetch_active() {
        let conn = setup();
        insert_rule(&conn, &rule("rule:1", "co:a", 1000)).unwrap();
        let fetched = fetch_active_rule(&conn, "rule:1", "co:a").unwrap();
        assert_eq!(fetched.transform_type, TransformKind::Format);
        assert_eq!(fetched.target_doc_type, "cost_summary");
    }

    #[test]
    fn test_inactive_rule_is_not_found() {
        let conn = setup();
        insert_rule(&conn, &rule("rule:1", "co:a", 1000)).unwrap();
        set_rule_active(&conn, "rule:1", "co:a", false).unwrap();
        let err = fetch_active_rule(&conn, "rule:1", "co:a").unwrap_err();
        assert_eq!(err.kind(), SyncErrorKind::NotFound);
    }

    #[test]
    fn test_list_active_rules_newest_first() {
        let conn = setup();
        insert_rule(&conn, &rule("rule:old", "co:a", 1000)).unwrap();
        insert_rule(&conn, &rule("rule:new", "co:a", 2000)).unwrap();
        insert_rule(&conn, &rule("rule:other", "co:b", 3000)).unwrap();

        let rules = list_active_rules(&conn, "co:a").unwrap();
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rule:new", "rule:old"]);
    }

    #[test]
    fn test_cross_tenant_rule_is_not_found() {
        let conn = setup();
        insert_rule(&conn, &rule("rule:1", "co:a", 1000)).unwrap();
        let err = fetch_active_rule(&conn, "rule:1", "co:b").unwrap_err();
        assert_eq!(err.kind(), SyncErrorKind::NotFound);
    }
}
