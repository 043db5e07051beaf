//! Diff output types.
//!
//! All types implement `Debug, Clone, Serialize, Deserialize, PartialEq`.
//! Block ordering follows snapshot field order, so output is stable and
//! reviewable top-to-bottom.

use serde::{Deserialize, Serialize};

/// The structured difference between two snapshots of the same document.
///
/// Unchanged paths are counted, not itemized, to bound output size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffResult {
    /// Paths present only in the newer snapshot
    pub additions: Vec<DiffBlock>,
    /// Paths present only in the older snapshot
    pub deletions: Vec<DiffBlock>,
    /// Paths present in both with different values
    pub modifications: Vec<DiffBlock>,
    /// Count of paths present in both with equal values
    pub unchanged: u64,
}

impl DiffResult {
    /// True when nothing changed between the two snapshots
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty() && self.modifications.is_empty()
    }
}

/// One contiguous change at a field path.
///
/// `line_start`/`line_end` are set only for modifications inside multi-line
/// text fields, where they delimit the changed run (0-based, inclusive,
/// in the newer snapshot's line numbering).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffBlock {
    /// Dot-path of the changed field
    pub path: String,
    /// Rendered content: the new value for additions/modifications, the
    /// removed value for deletions
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_end: Option<u32>,
}

impl DiffBlock {
    /// A whole-field block (no line range)
    pub fn field(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            line_start: None,
            line_end: None,
        }
    }
}

/// Compact change counts persisted on each Version, relative to its
/// predecessor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffSummary {
    pub additions: u64,
    pub deletions: u64,
    pub modifications: u64,
    /// Top-level sections whose content changed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections_changed: Vec<String>,
}
