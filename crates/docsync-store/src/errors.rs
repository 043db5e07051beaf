//! Error handling for docsync-store
//!
//! Wraps docsync-core SyncError with store-specific helpers

use docsync_core::errors::{SyncError, SyncErrorKind};
use rusqlite::ffi::ErrorCode;

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

/// Create a database error from rusqlite::Error.
///
/// Unique-constraint violations and busy/locked failures map to
/// `Concurrency` so the engine can retry a losing writer with a fresh read;
/// everything else is `Persistence`.
pub fn from_rusqlite(err: rusqlite::Error) -> SyncError {
    let kind = match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::ConstraintViolation => SyncErrorKind::Concurrency,
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => SyncErrorKind::Concurrency,
            _ => SyncErrorKind::Persistence,
        },
        _ => SyncErrorKind::Persistence,
    };
    SyncError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> SyncError {
    SyncError::new(SyncErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a not-found error for an entity, scoped by operation
pub fn not_found(op: &str, entity_id: &str, what: &str) -> SyncError {
    SyncError::new(SyncErrorKind::NotFound)
        .with_op(op.to_string())
        .with_entity_id(entity_id.to_string())
        .with_message(format!("{} not found", what))
}

/// Create a serialization error for a stored JSON column
pub fn column_decode(op: &str, entity_id: &str, reason: impl std::fmt::Display) -> SyncError {
    SyncError::new(SyncErrorKind::Serialization)
        .with_op(op.to_string())
        .with_entity_id(entity_id.to_string())
        .with_message(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_shape() {
        let err = not_found("latest_version", "doc:1", "document");
        assert_eq!(err.kind(), SyncErrorKind::NotFound);
        assert_eq!(err.entity_id(), Some("doc:1"));
    }

    #[test]
    fn test_constraint_violation_maps_to_concurrency() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (a INTEGER UNIQUE)", []).unwrap();
        conn.execute("INSERT INTO t (a) VALUES (1)", []).unwrap();
        let err = conn
            .execute("INSERT INTO t (a) VALUES (1)", [])
            .unwrap_err();
        assert_eq!(from_rusqlite(err).kind(), SyncErrorKind::Concurrency);
    }
}
