//! docsync Core - domain kernel for document synchronization
//!
//! This crate provides the foundational data structures and pure logic for
//! the sync engine, including:
//! - The snapshot value model (tagged union with dot-path resolution)
//! - Structured diffing between two snapshots of the same document
//! - Coordination transform semantics (copy/format/aggregate/reference)
//! - Domain models for versions, rules, conflicts, and audit records
//! - The canonical error facility and logging initialization
//!
//! Persistence lives in `docsync-store`; orchestration in `docsync-engine`.

pub mod diff;
pub mod errors;
pub mod logging;
pub mod model;
pub mod transform;
pub mod value;

// Re-export commonly used types
pub use errors::{Result, SyncError, SyncErrorKind, ValueError};
pub use model::{
    ArtifactStatus, CascadePreviewItem, ConflictResolution, CoordinationLogEntry,
    CoordinationRule, CoordinationStatus, Document, DocumentSource, FieldChange, SyncConflict,
    SyncStatus, Version,
};
pub use transform::TransformKind;
pub use value::{FieldPath, FieldValue, Snapshot};
