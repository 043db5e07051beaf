//! Diff computation engine.
//!
//! The entry point is [`snapshot_diff`], which compares two snapshots of the
//! same document at field/section granularity. Diffing is pure: it never
//! touches storage, and diffing a snapshot against itself yields an empty
//! result with `unchanged` equal to the field count.

use crate::diff::model::{DiffBlock, DiffResult, DiffSummary};
use crate::value::{FieldValue, Snapshot};
use std::collections::HashMap;

/// Compute a structured diff from snapshot `a` (older) to snapshot `b`
/// (newer).
///
/// Both snapshots are flattened to `(path, value)` pairs. A path present in
/// exactly one side becomes an addition (only in `b`) or deletion (only in
/// `a`). A path present in both with different values becomes one or more
/// modification blocks: multi-line text gets a line-oriented comparison
/// confined to that path; anything else yields a single block holding the
/// new value. Block order follows snapshot field order, not lexical sort.
pub fn snapshot_diff(a: &Snapshot, b: &Snapshot) -> DiffResult {
    let a_flat = a.flatten();
    let b_flat = b.flatten();

    let a_index: HashMap<&str, &FieldValue> =
        a_flat.iter().map(|(p, v)| (p.as_str(), *v)).collect();
    let b_index: HashMap<&str, &FieldValue> =
        b_flat.iter().map(|(p, v)| (p.as_str(), *v)).collect();

    let mut additions = Vec::new();
    let mut deletions = Vec::new();
    let mut modifications = Vec::new();
    let mut unchanged: u64 = 0;

    // Deletions walk the old side's field order
    for (path, old_value) in &a_flat {
        if !b_index.contains_key(path.as_str()) {
            deletions.push(DiffBlock::field(path.clone(), old_value.render()));
        }
    }

    // Additions and modifications walk the new side's field order
    for (path, new_value) in &b_flat {
        match a_index.get(path.as_str()) {
            None => additions.push(DiffBlock::field(path.clone(), new_value.render())),
            Some(old_value) if old_value == new_value => unchanged += 1,
            Some(old_value) => match (old_value, new_value) {
                (FieldValue::Text(old_text), FieldValue::Text(new_text))
                    if old_text.contains('\n') || new_text.contains('\n') =>
                {
                    modifications.extend(text_modifications(path, old_text, new_text));
                }
                _ => modifications.push(DiffBlock::field(path.clone(), new_value.render())),
            },
        }
    }

    DiffResult {
        additions,
        deletions,
        modifications,
        unchanged,
    }
}

/// Summarize a diff into the compact counts persisted on a Version, plus the
/// top-level sections that changed between the two snapshots.
pub fn summarize(diff: &DiffResult, a: &Snapshot, b: &Snapshot) -> DiffSummary {
    DiffSummary {
        additions: diff.additions.len() as u64,
        deletions: diff.deletions.len() as u64,
        modifications: diff.modifications.len() as u64,
        sections_changed: changed_sections(a, b),
    }
}

/// Top-level keys whose content differs between the two snapshots.
fn changed_sections(a: &Snapshot, b: &Snapshot) -> Vec<String> {
    let a_entries: HashMap<&str, &FieldValue> = a
        .entries()
        .iter()
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    let b_entries: HashMap<&str, &FieldValue> = b
        .entries()
        .iter()
        .map(|(k, v)| (k.as_str(), v))
        .collect();

    let mut changed = Vec::new();
    for (key, a_value) in a.entries().iter().map(|(k, v)| (k.as_str(), v)) {
        match b_entries.get(key) {
            Some(b_value) if *b_value == a_value => {}
            _ => changed.push(key.to_string()),
        }
    }
    for (key, _) in b.entries() {
        if !a_entries.contains_key(key.as_str()) {
            changed.push(key.clone());
        }
    }
    changed
}

// ---------------------------------------------------------------------------
// Line-oriented comparison for multi-line text fields
// ---------------------------------------------------------------------------

/// Per-line operation from the LCS walk, in forward order.
enum LineOp<'a> {
    Keep,
    Add(&'a str),
    Remove,
}

/// Diff a multi-line text field into one modification block per contiguous
/// changed run. Line numbers index the new text, 0-based inclusive.
fn text_modifications(path: &str, old_text: &str, new_text: &str) -> Vec<DiffBlock> {
    let old_lines: Vec<&str> = old_text.split('\n').collect();
    let new_lines: Vec<&str> = new_text.split('\n').collect();

    let ops = lcs_ops(&old_lines, &new_lines);

    let mut blocks = Vec::new();
    let mut new_index: u32 = 0;
    let mut run_start: Option<u32> = None;
    let mut run_lines: Vec<&str> = Vec::new();

    let mut close_run = |start: &mut Option<u32>, lines: &mut Vec<&str>, end_index: u32| {
        if let Some(s) = start.take() {
            let line_end = if lines.is_empty() {
                s
            } else {
                end_index.saturating_sub(1)
            };
            blocks.push(DiffBlock {
                path: path.to_string(),
                content: lines.join("\n"),
                line_start: Some(s),
                line_end: Some(line_end),
            });
            lines.clear();
        }
    };

    for op in ops {
        match op {
            LineOp::Keep => {
                close_run(&mut run_start, &mut run_lines, new_index);
                new_index += 1;
            }
            LineOp::Add(line) => {
                if run_start.is_none() {
                    run_start = Some(new_index);
                }
                run_lines.push(line);
                new_index += 1;
            }
            LineOp::Remove => {
                if run_start.is_none() {
                    run_start = Some(new_index);
                }
            }
        }
    }
    close_run(&mut run_start, &mut run_lines, new_index);

    blocks
}

/// Walk a longest-common-subsequence table backwards and return per-line
/// operations in forward order.
fn lcs_ops<'a>(old_lines: &[&str], new_lines: &[&'a str]) -> Vec<LineOp<'a>> {
    let m = old_lines.len();
    let n = new_lines.len();

    let mut table = vec![vec![0u32; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            table[i][j] = if old_lines[i - 1] == new_lines[j - 1] {
                table[i - 1][j - 1] + 1
            } else {
                table[i - 1][j].max(table[i][j - 1])
            };
        }
    }

    let mut ops = Vec::new();
    let mut i = m;
    let mut j = n;
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old_lines[i - 1] == new_lines[j - 1] {
            ops.push(LineOp::Keep);
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table[i][j - 1] >= table[i - 1][j]) {
            ops.push(LineOp::Add(new_lines[j - 1]));
            j -= 1;
        } else {
            ops.push(LineOp::Remove);
            i -= 1;
        }
    }
    ops.reverse();
    ops
}
