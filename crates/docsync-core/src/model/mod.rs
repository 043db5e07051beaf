//! Domain models for documents, versions, rules, conflicts, and audit
//! records.
//!
//! All persisted models are immutable snapshots of state; mutation happens
//! by appending (versions, log entries) or by explicit state transitions
//! recorded in place (conflict resolution, sync status).

mod artifact;
mod conflict;
mod coordination;
mod document;
mod version;

pub use artifact::ArtifactStatus;
pub use conflict::{ConflictResolution, SyncConflict, SyncStatus};
pub use coordination::{
    CascadePreviewItem, CoordinationLogEntry, CoordinationRule, CoordinationStatus, FieldChange,
    VALID_DOC_TYPES,
};
pub use document::{Document, DocumentSource};
pub use version::Version;
