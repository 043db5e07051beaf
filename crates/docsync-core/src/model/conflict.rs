//! Sync status and conflict lifecycle models.

use crate::errors::{SyncError, SyncErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-document synchronization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No external sync configured, or no outstanding operation
    Idle,
    /// An external push/pull is in flight
    Syncing,
    /// Last known external and internal snapshots agree
    Synced,
    /// Divergent edits detected; an open SyncConflict exists
    Conflict,
    /// The last sync attempt with an external source failed
    Error,
}

impl SyncStatus {
    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Conflict => "conflict",
            SyncStatus::Error => "error",
        }
    }

    /// Parse a wire name.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an unrecognized status.
    pub fn parse(s: &str) -> Result<Self, SyncError> {
        match s {
            "idle" => Ok(SyncStatus::Idle),
            "syncing" => Ok(SyncStatus::Syncing),
            "synced" => Ok(SyncStatus::Synced),
            "conflict" => Ok(SyncStatus::Conflict),
            "error" => Ok(SyncStatus::Error),
            other => Err(SyncError::new(SyncErrorKind::InvalidInput)
                .with_op("sync_status_parse")
                .with_message(format!("unknown sync status '{}'", other))),
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a conflict was (or will be) resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Keep the natively-authored side
    KeepLocal,
    /// Keep the externally-sourced side
    KeepCloud,
    /// Apply a caller-supplied merged snapshot
    Merge,
}

impl ConflictResolution {
    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictResolution::KeepLocal => "keep_local",
            ConflictResolution::KeepCloud => "keep_cloud",
            ConflictResolution::Merge => "merge",
        }
    }

    /// Parse a wire name.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an unrecognized resolution.
    pub fn parse(s: &str) -> Result<Self, SyncError> {
        match s {
            "keep_local" => Ok(ConflictResolution::KeepLocal),
            "keep_cloud" => Ok(ConflictResolution::KeepCloud),
            "merge" => Ok(ConflictResolution::Merge),
            other => Err(SyncError::new(SyncErrorKind::InvalidInput)
                .with_op("conflict_resolution_parse")
                .with_message(format!("unknown conflict resolution '{}'", other))),
        }
    }
}

/// A detected divergence between two sources' edits to one document.
///
/// Created by the tracker when a version arrives while another source's
/// pending edit is unreconciled. Resolved, never deleted: resolution appends
/// a new Version representing the chosen outcome and fills the resolution
/// fields here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConflict {
    pub id: String,
    pub document_id: String,
    pub company_id: String,
    /// Version number of the natively-authored competing side
    pub local_version_number: u32,
    /// Version number of the externally-sourced competing side
    pub cloud_version_number: u32,
    pub detected_at: DateTime<Utc>,
    pub resolution: Option<ConflictResolution>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SyncConflict {
    /// True while no resolution has been recorded
    pub fn is_open(&self) -> bool {
        self.resolution.is_none()
    }
}
