//! Audit log sink boundary.
//!
//! The audit log is an external collaborator. Recording is fire-and-forget:
//! a sink must swallow its own failures, because failing to audit must not
//! fail the primary operation.

use serde_json::Value;

/// Destination for audit events emitted by engine operations.
pub trait AuditSink {
    /// Record one audit event. Implementations must not panic and must not
    /// surface errors to the caller.
    fn record(
        &self,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        user_id: &str,
        details: Value,
    );
}

/// Default sink: emits audit events as structured log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(
        &self,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        user_id: &str,
        details: Value,
    ) {
        tracing::info!(
            action = %action,
            entity_type = %entity_type,
            entity_id = %entity_id,
            user_id = %user_id,
            details = %details,
            "audit"
        );
    }
}

/// Sink that drops everything; for tests and embedded callers that bring
/// their own auditing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _: &str, _: &str, _: &str, _: &str, _: Value) {}
}
