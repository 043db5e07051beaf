//! Snapshot value model with dot-path resolution.
//!
//! Snapshots are dynamic, user-shaped records. Rather than duck-typing
//! against raw JSON everywhere, the engine works against [`FieldValue`], a
//! closed tagged union, so "field present but wrong shape" is a distinct,
//! testable case. Map entries keep insertion order; the diff engine's output
//! ordering depends on it.

use crate::errors::ValueError;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

/// A dot-separated address into a snapshot's nested structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parse a dot-separated path.
    ///
    /// # Errors
    ///
    /// `InvalidPath` if the path is empty or contains an empty segment
    /// (e.g. `"a..b"` or a trailing dot).
    pub fn parse(path: &str) -> Result<Self, ValueError> {
        if path.is_empty() {
            return Err(ValueError::InvalidPath {
                path: path.to_string(),
                reason: "path is empty".to_string(),
            });
        }
        let segments: Vec<String> = path.split('.').map(|s| s.to_string()).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ValueError::InvalidPath {
                path: path.to_string(),
                reason: "path contains an empty segment".to_string(),
            });
        }
        Ok(Self(segments))
    }

    /// Path segments in order
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A dynamically-shaped snapshot field value.
///
/// Maps are association lists so that field order is insertion order, not
/// lexical order. Lists and maps nest arbitrarily.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<FieldValue>),
    Map(Vec<(String, FieldValue)>),
}

impl FieldValue {
    /// Short name of the variant, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "text",
            FieldValue::List(_) => "list",
            FieldValue::Map(_) => "map",
        }
    }

    /// The text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric content, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Render this value as display text.
    ///
    /// Text renders bare; everything else renders as compact JSON. Used for
    /// diff block content and log old/new values.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            other => serde_json::to_string(&other.to_json()).unwrap_or_default(),
        }
    }

    /// Convert to a `serde_json::Value` (map order preserved)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Number(n) => {
                // Keep integers as integers so 500000 does not become 500000.0
                if n.fract() == 0.0 && n.is_finite() && n.abs() < i64::MAX as f64 {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::List(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json()).collect())
            }
            FieldValue::Map(entries) => {
                let mut map = serde_json::Map::new();
                for (k, v) in entries {
                    map.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }

    /// Build from a `serde_json::Value` (map order preserved)
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            serde_json::Value::Array(items) => {
                FieldValue::List(items.iter().map(FieldValue::from_json).collect())
            }
            serde_json::Value::Object(map) => FieldValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < i64::MAX as f64 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            FieldValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(FieldValue::from_json(&raw))
    }
}

/// The structured content of a document at a specific version.
///
/// Always a map at the root. Owns all path resolution: reading a missing
/// path yields `None` ("undefined"), which is distinct from a present
/// `FieldValue::Null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot(FieldValue);

impl Snapshot {
    /// Create an empty snapshot
    pub fn empty() -> Self {
        Self(FieldValue::Map(Vec::new()))
    }

    /// Wrap a field value as a snapshot root.
    ///
    /// # Errors
    ///
    /// `RootNotMap` if the value is not a map.
    pub fn new(root: FieldValue) -> Result<Self, ValueError> {
        match root {
            FieldValue::Map(_) => Ok(Self(root)),
            other => Err(ValueError::RootNotMap {
                actual: other.type_name().to_string(),
            }),
        }
    }

    /// Parse a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// `RootNotMap` if the JSON root is not an object; `InvalidPath` never.
    pub fn from_json_str(text: &str) -> Result<Self, ValueError> {
        let raw: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ValueError::RootNotMap {
                actual: format!("unparseable JSON ({})", e),
            })?;
        Self::new(FieldValue::from_json(&raw))
    }

    /// Serialize to JSON text (field order preserved)
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(&self.0.to_json()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Root map entries in insertion order
    pub fn entries(&self) -> &[(String, FieldValue)] {
        match &self.0 {
            FieldValue::Map(entries) => entries,
            _ => unreachable!("snapshot root is always a map"),
        }
    }

    /// Read the value at a dot-path. `None` means the path does not resolve.
    pub fn get_path(&self, path: &FieldPath) -> Option<&FieldValue> {
        let mut current = &self.0;
        for segment in path.segments() {
            match current {
                FieldValue::Map(entries) => {
                    current = entries.iter().find(|(k, _)| k == segment).map(|(_, v)| v)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }

    /// Return a copy with `value` written at `path`.
    ///
    /// Intermediate maps are created as needed; existing sibling fields are
    /// untouched. A non-map intermediate is replaced by a map, matching the
    /// source system's write semantics.
    pub fn set_path(&self, path: &FieldPath, value: FieldValue) -> Snapshot {
        let mut root = self.0.clone();
        set_in(&mut root, path.segments(), value);
        Snapshot(root)
    }

    /// Flatten to `(dot-path, value)` leaf pairs in snapshot field order.
    ///
    /// Maps are recursed into; every other variant (including lists) is a
    /// leaf compared wholesale.
    pub fn flatten(&self) -> Vec<(String, &FieldValue)> {
        let mut out = Vec::new();
        flatten_into("", &self.0, &mut out);
        out
    }

    /// Declared document type, when the snapshot carries one
    pub fn doc_type(&self) -> Option<&str> {
        self.entries()
            .iter()
            .find(|(k, _)| k == "doc_type")
            .and_then(|(_, v)| v.as_text())
    }

    /// Display title: `title`, falling back to `name`
    pub fn title(&self) -> Option<&str> {
        for key in ["title", "name"] {
            if let Some(text) = self
                .entries()
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| v.as_text())
            {
                return Some(text);
            }
        }
        None
    }

    /// Count whitespace-separated words across all text fields
    pub fn word_count(&self) -> u64 {
        fn count(value: &FieldValue) -> u64 {
            match value {
                FieldValue::Text(s) => s.split_whitespace().count() as u64,
                FieldValue::List(items) => items.iter().map(count).sum(),
                FieldValue::Map(entries) => entries.iter().map(|(_, v)| count(v)).sum(),
                _ => 0,
            }
        }
        count(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = FieldValue::deserialize(deserializer)?;
        Snapshot::new(value).map_err(serde::de::Error::custom)
    }
}

fn set_in(current: &mut FieldValue, segments: &[String], value: FieldValue) {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => return,
    };

    let entries = match current {
        FieldValue::Map(entries) => entries,
        other => {
            *other = FieldValue::Map(Vec::new());
            match other {
                FieldValue::Map(entries) => entries,
                _ => unreachable!(),
            }
        }
    };

    if rest.is_empty() {
        match entries.iter_mut().find(|(k, _)| k == head) {
            Some((_, slot)) => *slot = value,
            None => entries.push((head.clone(), value)),
        }
        return;
    }

    let slot = match entries.iter_mut().position(|(k, _)| k == head) {
        Some(idx) => &mut entries[idx].1,
        None => {
            entries.push((head.clone(), FieldValue::Map(Vec::new())));
            &mut entries.last_mut().expect("just pushed").1
        }
    };
    set_in(slot, rest, value);
}

fn flatten_into<'a>(prefix: &str, value: &'a FieldValue, out: &mut Vec<(String, &'a FieldValue)>) {
    match value {
        FieldValue::Map(entries) => {
            for (key, child) in entries {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(&path, child, out);
            }
            // An empty nested map flattens to nothing; the root map is never
            // emitted as a leaf either.
        }
        leaf => {
            if !prefix.is_empty() {
                out.push((prefix.to_string(), leaf));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(json: &str) -> Snapshot {
        Snapshot::from_json_str(json).unwrap()
    }

    #[test]
    fn test_field_path_parse() {
        let path = FieldPath::parse("contract.value").unwrap();
        assert_eq!(path.segments(), &["contract", "value"]);
        assert_eq!(path.to_string(), "contract.value");
    }

    #[test]
    fn test_field_path_rejects_empty() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse("a.").is_err());
    }

    #[test]
    fn test_get_path_missing_is_none_null_is_some() {
        let snap = snapshot(r#"{"a": {"b": null}}"#);
        let null_path = FieldPath::parse("a.b").unwrap();
        let missing_path = FieldPath::parse("a.c").unwrap();
        assert_eq!(snap.get_path(&null_path), Some(&FieldValue::Null));
        assert_eq!(snap.get_path(&missing_path), None);
    }

    #[test]
    fn test_get_path_through_non_map_is_none() {
        let snap = snapshot(r#"{"a": "scalar"}"#);
        let path = FieldPath::parse("a.b").unwrap();
        assert_eq!(snap.get_path(&path), None);
    }

    #[test]
    fn test_set_path_creates_intermediates_preserves_siblings() {
        let snap = snapshot(r#"{"summary": {"label": "Totals"}, "other": 1}"#);
        let path = FieldPath::parse("summary.total").unwrap();
        let updated = snap.set_path(&path, FieldValue::Text("$500,000".to_string()));

        assert_eq!(
            updated.get_path(&path),
            Some(&FieldValue::Text("$500,000".to_string()))
        );
        let label = FieldPath::parse("summary.label").unwrap();
        assert_eq!(
            updated.get_path(&label),
            Some(&FieldValue::Text("Totals".to_string()))
        );
        let other = FieldPath::parse("other").unwrap();
        assert_eq!(updated.get_path(&other), Some(&FieldValue::Number(1.0)));
        // Original untouched
        assert_eq!(snap.get_path(&path), None);
    }

    #[test]
    fn test_set_path_replaces_non_map_intermediate() {
        let snap = snapshot(r#"{"a": "scalar"}"#);
        let path = FieldPath::parse("a.b").unwrap();
        let updated = snap.set_path(&path, FieldValue::Number(2.0));
        assert_eq!(updated.get_path(&path), Some(&FieldValue::Number(2.0)));
    }

    #[test]
    fn test_flatten_preserves_field_order() {
        let snap = snapshot(r#"{"z": 1, "a": {"m": 2, "b": 3}, "k": [1, 2]}"#);
        let flat = snap.flatten();
        let paths: Vec<&str> = flat.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["z", "a.m", "a.b", "k"]);
    }

    #[test]
    fn test_flatten_lists_are_leaves() {
        let snap = snapshot(r#"{"items": [{"x": 1}]}"#);
        let flat = snap.flatten();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].0, "items");
        assert!(matches!(flat[0].1, FieldValue::List(_)));
    }

    #[test]
    fn test_root_must_be_map() {
        let err = Snapshot::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, ValueError::RootNotMap { .. }));
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let snap = snapshot(r#"{"z": 1, "a": 2, "m": {"q": 3, "b": 4}}"#);
        let text = snap.to_json_string();
        let back = Snapshot::from_json_str(&text).unwrap();
        assert_eq!(snap, back);
        let flat = back.flatten();
        let paths: Vec<&str> = flat.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["z", "a", "m.q", "m.b"]);
    }

    #[test]
    fn test_integers_survive_render() {
        let snap = snapshot(r#"{"n": 500000}"#);
        assert_eq!(snap.to_json_string(), r#"{"n":500000}"#);
    }

    #[test]
    fn test_word_count() {
        let snap = snapshot(r#"{"intro": "one two three", "meta": {"note": "four"}, "n": 7}"#);
        assert_eq!(snap.word_count(), 4);
    }

    #[test]
    fn test_doc_type_and_title() {
        let snap = snapshot(r#"{"doc_type": "cost_summary", "title": "Cost Summary"}"#);
        assert_eq!(snap.doc_type(), Some("cost_summary"));
        assert_eq!(snap.title(), Some("Cost Summary"));

        let named = snapshot(r#"{"name": "Cover Letter"}"#);
        assert_eq!(named.title(), Some("Cover Letter"));
    }
}
