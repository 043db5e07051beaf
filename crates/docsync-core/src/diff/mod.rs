//! Structured diffing between two snapshots of a document.

pub mod engine;
pub mod model;

pub use engine::{snapshot_diff, summarize};
pub use model::{DiffBlock, DiffResult, DiffSummary};
