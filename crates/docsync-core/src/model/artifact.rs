//! Derived per-artifact presentation status.

use crate::model::{DocumentSource, SyncStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only projection of one document for presentation: latest version,
/// sync status, last editor, and word count. Computed on read, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactStatus {
    pub document_id: String,
    /// Display name of the artifact (document title)
    pub volume_name: String,
    pub doc_type: String,
    pub sync_status: SyncStatus,
    pub latest_version_number: Option<u32>,
    pub last_edited_by: Option<String>,
    pub last_edited_at: Option<DateTime<Utc>>,
    pub edit_source: Option<DocumentSource>,
    pub word_count: u64,
}
