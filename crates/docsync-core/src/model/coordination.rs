//! Coordination rules and their execution audit trail.

use crate::errors::{SyncError, SyncErrorKind};
use crate::transform::TransformKind;
use crate::value::{FieldPath, FieldValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document types a rule may reference.
pub const VALID_DOC_TYPES: &[&str] = &[
    "cover_letter",
    "executive_summary",
    "technical_volume",
    "management_volume",
    "past_performance",
    "pricing_volume",
    "cost_summary",
    "staffing_plan",
    "quality_plan",
    "transition_plan",
    "subcontracting_plan",
    "compliance_matrix",
    "resume",
    "org_chart",
    "schedule",
    "risk_register",
];

/// A tenant-scoped, user-authored propagation rule.
///
/// Authored and edited by the authoring layer; the engine only reads and
/// executes. Created active; deactivation is a soft-disable, and inactive
/// rules are never loaded for execution or preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationRule {
    pub id: String,
    pub company_id: String,
    /// Artifact type the rule listens on
    pub source_doc_type: String,
    /// Dot-path read from the trigger document's latest snapshot
    pub source_field_path: String,
    /// Artifact type whose documents receive the cascade
    pub target_doc_type: String,
    /// Dot-path written into each target snapshot
    pub target_field_path: String,
    pub transform_type: TransformKind,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl CoordinationRule {
    /// Validate a user-authored rule before it is stored.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` — unknown doc type, or the rule would write back to
    ///   the field it reads (self-referencing)
    /// - `InvalidFieldPath` — either path fails to parse
    pub fn validate(&self) -> Result<(), SyncError> {
        for (label, doc_type) in [
            ("source", self.source_doc_type.as_str()),
            ("target", self.target_doc_type.as_str()),
        ] {
            if !VALID_DOC_TYPES.contains(&doc_type) {
                return Err(SyncError::new(SyncErrorKind::InvalidInput)
                    .with_op("rule_validate")
                    .with_entity_id(self.id.clone())
                    .with_message(format!(
                        "invalid {} document type '{}'",
                        label, doc_type
                    )));
            }
        }

        FieldPath::parse(&self.source_field_path)?;
        FieldPath::parse(&self.target_field_path)?;

        if self.source_doc_type == self.target_doc_type
            && self.source_field_path == self.target_field_path
        {
            return Err(SyncError::new(SyncErrorKind::InvalidInput)
                .with_op("rule_validate")
                .with_entity_id(self.id.clone())
                .with_message("rule may not target the field it reads"));
        }

        Ok(())
    }
}

/// Outcome classification of one rule execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinationStatus {
    /// All targets updated
    Applied,
    /// A failure occurred; `affected_documents` holds how far the cascade got
    Failed,
    /// The rule did not apply (absent source value, or no targets)
    Skipped,
}

impl CoordinationStatus {
    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinationStatus::Applied => "applied",
            CoordinationStatus::Failed => "failed",
            CoordinationStatus::Skipped => "skipped",
        }
    }
}

/// One field write performed (or previewed) on a target document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub document_id: String,
    pub field_path: String,
    /// Value before the write; absent when the target field did not exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<FieldValue>,
    pub new_value: FieldValue,
}

/// Immutable audit record of one rule execution attempt.
///
/// Exactly one entry is written per attempt regardless of outcome. This is
/// the only durable record of why a cascade did or did not happen, and the
/// primary tool for manual remediation of partial cascades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationLogEntry {
    pub id: String,
    pub rule_id: String,
    pub trigger_document_id: String,
    pub company_id: String,
    /// Documents actually touched, in cascade order
    pub affected_documents: Vec<String>,
    pub changes_applied: Vec<FieldChange>,
    pub status: CoordinationStatus,
    pub error_message: Option<String>,
    pub executed_at: DateTime<Utc>,
}

/// One row of a cascade preview: what would change on one target document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadePreviewItem {
    pub rule_id: String,
    pub rule_description: Option<String>,
    pub target_doc_type: String,
    pub target_field_path: String,
    pub document_id: String,
    pub document_title: String,
    /// Current value at the target path; absent when the field does not exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<FieldValue>,
    pub new_value: FieldValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> CoordinationRule {
        CoordinationRule {
            id: "rule:1".to_string(),
            company_id: "co:1".to_string(),
            source_doc_type: "cover_letter".to_string(),
            source_field_path: "contract.value".to_string(),
            target_doc_type: "cost_summary".to_string(),
            target_field_path: "summary.total".to_string(),
            transform_type: TransformKind::Format,
            description: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_rule() {
        assert!(rule().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_doc_type() {
        let mut bad = rule();
        bad.source_doc_type = "grocery_list".to_string();
        let err = bad.validate().unwrap_err();
        assert_eq!(err.kind(), SyncErrorKind::InvalidInput);
    }

    #[test]
    fn test_validate_rejects_malformed_path() {
        let mut bad = rule();
        bad.target_field_path = "summary..total".to_string();
        let err = bad.validate().unwrap_err();
        assert_eq!(err.kind(), SyncErrorKind::InvalidFieldPath);
    }

    #[test]
    fn test_validate_rejects_self_reference() {
        let mut bad = rule();
        bad.target_doc_type = bad.source_doc_type.clone();
        bad.target_field_path = bad.source_field_path.clone();
        let err = bad.validate().unwrap_err();
        assert_eq!(err.kind(), SyncErrorKind::InvalidInput);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(CoordinationStatus::Applied.as_str(), "applied");
        assert_eq!(CoordinationStatus::Failed.as_str(), "failed");
        assert_eq!(CoordinationStatus::Skipped.as_str(), "skipped");
    }

    #[test]
    fn test_field_change_omits_absent_old_value() {
        let change = FieldChange {
            document_id: "doc:2".to_string(),
            field_path: "summary.total".to_string(),
            old_value: None,
            new_value: FieldValue::Text("$500,000".to_string()),
        };
        let json = serde_json::to_string(&change).unwrap();
        assert!(!json.contains("old_value"), "absent old value stays absent");

        let with_null = FieldChange {
            old_value: Some(FieldValue::Null),
            ..change
        };
        let json = serde_json::to_string(&with_null).unwrap();
        assert!(json.contains("\"old_value\":null"), "null is distinct from absent");
    }

    #[test]
    fn test_log_entry_serde_round_trip() {
        let entry = CoordinationLogEntry {
            id: "log:1".to_string(),
            rule_id: "rule:1".to_string(),
            trigger_document_id: "doc:1".to_string(),
            company_id: "co:1".to_string(),
            affected_documents: vec!["doc:2".to_string()],
            changes_applied: vec![FieldChange {
                document_id: "doc:2".to_string(),
                field_path: "summary.total".to_string(),
                old_value: Some(FieldValue::Text("$0".to_string())),
                new_value: FieldValue::Text("$500,000".to_string()),
            }],
            status: CoordinationStatus::Applied,
            error_message: None,
            executed_at: Utc::now(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: CoordinationLogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
