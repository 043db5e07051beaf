//! docsync Engine - Orchestration layer
//!
//! Coordinates between the domain kernel and the persistence layer: version
//! appending with atomic number assignment, the sync/conflict lifecycle,
//! and coordination rule execution/preview. All operations are
//! request-scoped and stateless between calls; the version ledger is the
//! only shared resource and the authority for ordering.

pub mod audit;
pub mod commands;
pub mod config;

pub use audit::{AuditSink, NoopAuditSink, TracingAuditSink};
pub use config::EngineConfig;
