//! Immutable version snapshots.

use crate::diff::DiffSummary;
use crate::model::DocumentSource;
use crate::value::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable snapshot of a document.
///
/// Version numbers start at 1 and are strictly increasing per document; the
/// version with the maximum number *is* the current version. Nothing
/// mutates a version after creation; corrections are new versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: String,
    pub document_id: String,
    pub company_id: String,
    pub version_number: u32,
    /// Which editing surface produced this version
    pub source: DocumentSource,
    pub snapshot: Snapshot,
    /// Change counts relative to the immediately preceding version; None for
    /// version 1
    pub diff_summary: Option<DiffSummary>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// True for the first version of a document
    pub fn is_initial(&self) -> bool {
        self.version_number == 1
    }
}
