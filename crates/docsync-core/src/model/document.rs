//! Document registry model and edit sources.

use crate::errors::{SyncError, SyncErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logical collaboratively-edited artifact (a proposal volume or section).
///
/// Created by the authoring layer, never deleted by this subsystem. Scoped
/// to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub company_id: String,
    /// Artifact type tag used by coordination rules to find targets
    pub doc_type: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Which editing surface produced a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    /// The platform's native editor (also used for cascade and resolution
    /// writes)
    Native,
    WordOnline,
    ExcelOnline,
    PptxOnline,
    GoogleDocs,
    GoogleSheets,
}

impl DocumentSource {
    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSource::Native => "native",
            DocumentSource::WordOnline => "word_online",
            DocumentSource::ExcelOnline => "excel_online",
            DocumentSource::PptxOnline => "pptx_online",
            DocumentSource::GoogleDocs => "google_docs",
            DocumentSource::GoogleSheets => "google_sheets",
        }
    }

    /// Parse a wire name.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an unrecognized source.
    pub fn parse(s: &str) -> Result<Self, SyncError> {
        match s {
            "native" => Ok(DocumentSource::Native),
            "word_online" => Ok(DocumentSource::WordOnline),
            "excel_online" => Ok(DocumentSource::ExcelOnline),
            "pptx_online" => Ok(DocumentSource::PptxOnline),
            "google_docs" => Ok(DocumentSource::GoogleDocs),
            "google_sheets" => Ok(DocumentSource::GoogleSheets),
            other => Err(SyncError::new(SyncErrorKind::InvalidInput)
                .with_op("document_source_parse")
                .with_message(format!("unknown document source '{}'", other))),
        }
    }

    /// True for cloud editing surfaces (anything but the native editor)
    pub fn is_external(&self) -> bool {
        !matches!(self, DocumentSource::Native)
    }
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
