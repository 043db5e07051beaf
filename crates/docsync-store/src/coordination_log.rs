//! Coordination execution audit trail.
//!
//! Exactly one immutable entry per execution attempt; queryable by rule and
//! by trigger document for remediation of partial cascades.

#![allow(clippy::result_large_err)]

use crate::errors::{column_decode, from_rusqlite, Result};
use chrono::{TimeZone, Utc};
use docsync_core::model::{CoordinationLogEntry, CoordinationStatus, FieldChange};
use rusqlite::Connection;

/// Insert one log entry.
pub fn insert_entry(conn: &Connection, entry: &CoordinationLogEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO coordination_log
             (id, rule_id, trigger_document_id, company_id,
              affected_documents, changes_applied, status, error_message, executed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            entry.id,
            entry.rule_id,
            entry.trigger_document_id,
            entry.company_id,
            serde_json::to_string(&entry.affected_documents)?,
            serde_json::to_string(&entry.changes_applied)?,
            entry.status.as_str(),
            entry.error_message,
            entry.executed_at.timestamp_millis(),
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

/// Log entries for a rule, newest first.
pub fn list_for_rule(
    conn: &Connection,
    rule_id: &str,
    company_id: &str,
) -> Result<Vec<CoordinationLogEntry>> {
    list_where(
        conn,
        "rule_id = ?1 AND company_id = ?2",
        [rule_id, company_id],
    )
}

/// Log entries for a trigger document, newest first.
pub fn list_for_trigger(
    conn: &Connection,
    trigger_document_id: &str,
    company_id: &str,
) -> Result<Vec<CoordinationLogEntry>> {
    list_where(
        conn,
        "trigger_document_id = ?1 AND company_id = ?2",
        [trigger_document_id, company_id],
    )
}

fn list_where(
    conn: &Connection,
    predicate: &str,
    params: [&str; 2],
) -> Result<Vec<CoordinationLogEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT id, rule_id, trigger_document_id, company_id,
                    affected_documents, changes_applied, status, error_message, executed_at
             FROM coordination_log
             WHERE {}
             ORDER BY executed_at DESC, id DESC",
            predicate
        ))
        .map_err(from_rusqlite)?;
    let rows: std::result::Result<Vec<_>, _> = stmt
        .query_map(params, row_to_raw)
        .map_err(from_rusqlite)?
        .collect();
    rows.map_err(from_rusqlite)?
        .into_iter()
        .map(raw_to_entry)
        .collect()
}

struct RawEntry {
    id: String,
    rule_id: String,
    trigger_document_id: String,
    company_id: String,
    affected_documents: String,
    changes_applied: String,
    status: String,
    error_message: Option<String>,
    executed_at_ms: i64,
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        id: row.get(0)?,
        rule_id: row.get(1)?,
        trigger_document_id: row.get(2)?,
        company_id: row.get(3)?,
        affected_documents: row.get(4)?,
        changes_applied: row.get(5)?,
        status: row.get(6)?,
        error_message: row.get(7)?,
        executed_at_ms: row.get(8)?,
    })
}

fn raw_to_entry(raw: RawEntry) -> Result<CoordinationLogEntry> {
    let affected_documents: Vec<String> = serde_json::from_str(&raw.affected_documents)
        .map_err(|e| column_decode("raw_to_entry", &raw.id, e))?;
    let changes_applied: Vec<FieldChange> = serde_json::from_str(&raw.changes_applied)
        .map_err(|e| column_decode("raw_to_entry", &raw.id, e))?;
    let status = match raw.status.as_str() {
        "applied" => CoordinationStatus::Applied,
        "failed" => CoordinationStatus::Failed,
        "skipped" => CoordinationStatus::Skipped,
        other => {
            return Err(column_decode(
                "raw_to_entry",
                &raw.id,
                format!("unknown coordination status '{}'", other),
            ))
        }
    };
    Ok(CoordinationLogEntry {
        id: raw.id,
        rule_id: raw.rule_id,
        trigger_document_id: raw.trigger_document_id,
        company_id: raw.company_id,
        affected_documents,
        changes_applied,
        status,
        error_message: raw.error_message,
        executed_at: Utc
            .timestamp_millis_opt(raw.executed_at_ms)
            .single()
            .unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_core::value::FieldValue;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::migrations::apply_migrations(&mut conn).unwrap();
        conn
    }

    fn entry(id: &str, status: CoordinationStatus, executed_ms: i64) -> CoordinationLogEntry {
        CoordinationLogEntry {
            id: id.to_string(),
            rule_id: "rule:1".to_string(),
            trigger_document_id: "doc:1".to_string(),
            company_id: "co:a".to_string(),
            affected_documents: vec!["doc:2".to_string()],
            changes_applied: vec![FieldChange {
                document_id: "doc:2".to_string(),
                field_path: "summary.total".to_string(),
                old_value: Some(FieldValue::Text("$0".to_string())),
                new_value: FieldValue::Text("$500,000".to_string()),
            }],
            status,
            error_message: None,
            executed_at: Utc.timestamp_millis_opt(executed_ms).unwrap(),
        }
    }

    #[test]
    fn test_insert_and_list_for_rule() {
        let conn = setup();
        insert_entry(&conn, &entry("log:1", CoordinationStatus::Applied, 1000)).unwrap();
        insert_entry(&conn, &entry("log:2", CoordinationStatus::Skipped, 2000)).unwrap();

        let entries = list_for_rule(&conn, "rule:1", "co:a").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "log:2", "newest first");
        assert_eq!(entries[1].changes_applied.len(), 1);
    }

    #[test]
    fn test_list_for_trigger() {
        let conn = setup();
        insert_entry(&conn, &entry("log:1", CoordinationStatus::Failed, 1000)).unwrap();
        let entries = list_for_trigger(&conn, "doc:1", "co:a").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, CoordinationStatus::Failed);
    }

    #[test]
    fn test_tenant_scoping() {
        let conn = setup();
        insert_entry(&conn, &entry("log:1", CoordinationStatus::Applied, 1000)).unwrap();
        assert!(list_for_rule(&conn, "rule:1", "co:b").unwrap().is_empty());
    }
}
