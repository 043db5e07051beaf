//! docsync Store - SQLite persistence layer
//!
//! Owns the append-only `document_versions` ledger and the tables backing
//! the sync/conflict tracker and the coordination rule engine. Every read
//! and write is scoped by `company_id`; a cross-tenant miss is always
//! `NotFound`, never a distinct forbidden error.

pub mod conflicts;
pub mod coordination_log;
pub mod db;
pub mod documents;
pub mod errors;
pub mod migrations;
pub mod rules;
pub mod sync_state;
pub mod versions;
