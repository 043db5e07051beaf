//! Property tests for the diff engine.
//!
//! Two laws hold for every snapshot pair:
//! - diffing a snapshot against itself is empty, with `unchanged` equal to
//!   the flattened field count
//! - additions of a→b equal deletions of b→a (and vice versa)

use docsync_core::diff::snapshot_diff;
use docsync_core::value::{FieldValue, Snapshot};
use proptest::prelude::*;

/// Generate a leaf value
fn leaf_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        (-1_000_000i64..1_000_000i64).prop_map(|n| FieldValue::Number(n as f64)),
        "[a-z ]{0,20}".prop_map(FieldValue::Text),
    ]
}

/// Generate a snapshot: a flat-or-one-level-nested map with short keys
fn snapshot() -> impl Strategy<Value = Snapshot> {
    let entry = ("[a-z]{1,6}", leaf_value());
    let nested = (
        "[a-z]{1,6}",
        prop::collection::vec(("[a-z]{1,6}", leaf_value()), 0..4)
            .prop_map(dedup_entries)
            .prop_map(FieldValue::Map),
    );
    prop::collection::vec(prop_oneof![entry, nested], 0..8).prop_map(|entries| {
        Snapshot::new(FieldValue::Map(dedup_entries(entries))).unwrap()
    })
}

/// Drop duplicate keys, keeping first occurrence (maps have unique keys)
fn dedup_entries(entries: Vec<(String, FieldValue)>) -> Vec<(String, FieldValue)> {
    let mut seen = std::collections::HashSet::new();
    entries
        .into_iter()
        .filter(|(k, _)| seen.insert(k.clone()))
        .collect()
}

proptest! {
    #[test]
    fn diff_against_self_is_empty(snap in snapshot()) {
        let diff = snapshot_diff(&snap, &snap);
        prop_assert!(diff.is_empty());
        prop_assert_eq!(diff.unchanged, snap.flatten().len() as u64);
    }

    #[test]
    fn additions_mirror_deletions(a in snapshot(), b in snapshot()) {
        let forward = snapshot_diff(&a, &b);
        let backward = snapshot_diff(&b, &a);

        let fwd_added: Vec<String> =
            forward.additions.iter().map(|d| d.path.clone()).collect();
        let bwd_removed: Vec<String> =
            backward.deletions.iter().map(|d| d.path.clone()).collect();
        prop_assert_eq!(fwd_added, bwd_removed);

        let fwd_removed: Vec<String> =
            forward.deletions.iter().map(|d| d.path.clone()).collect();
        let bwd_added: Vec<String> =
            backward.additions.iter().map(|d| d.path.clone()).collect();
        prop_assert_eq!(fwd_removed, bwd_added);

        prop_assert_eq!(forward.unchanged, backward.unchanged);
    }
}
