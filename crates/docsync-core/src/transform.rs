//! Coordination transform semantics.
//!
//! A transform is a pure function of the source value; it never reads target
//! state. The set is a closed enum with one handler per case, so adding a
//! transform is a compile-checked extension point.

use crate::errors::{SyncError, SyncErrorKind};
use crate::value::FieldValue;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The kind of propagation a coordination rule performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// Direct value replication
    Copy,
    /// Numbers become currency strings, dates normalize, everything else
    /// coerces to text
    Format,
    /// Sum a list of numeric-coercible values
    Aggregate,
    /// Wrap the value as an opaque cross-reference marker
    Reference,
}

impl TransformKind {
    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKind::Copy => "copy",
            TransformKind::Format => "format",
            TransformKind::Aggregate => "aggregate",
            TransformKind::Reference => "reference",
        }
    }

    /// Parse a wire name.
    ///
    /// # Errors
    ///
    /// `UnknownTransform` for anything outside the closed set.
    pub fn parse(s: &str) -> Result<Self, SyncError> {
        match s {
            "copy" => Ok(TransformKind::Copy),
            "format" => Ok(TransformKind::Format),
            "aggregate" => Ok(TransformKind::Aggregate),
            "reference" => Ok(TransformKind::Reference),
            other => Err(SyncError::new(SyncErrorKind::UnknownTransform)
                .with_op("transform_parse")
                .with_message(format!("unknown transform type '{}'", other))),
        }
    }

    /// Apply this transform to a source value.
    pub fn apply(&self, source: &FieldValue) -> FieldValue {
        match self {
            TransformKind::Copy => source.clone(),
            TransformKind::Format => FieldValue::Text(format_value(source)),
            TransformKind::Aggregate => aggregate(source),
            TransformKind::Reference => {
                FieldValue::Text(format!("[ref:{}]", coerce_text(source)))
            }
        }
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Format a value for display: numbers as en-US currency without cents,
/// date-shaped text normalized, everything else coerced to text.
fn format_value(source: &FieldValue) -> String {
    match source {
        FieldValue::Number(n) => format_usd(*n),
        FieldValue::Text(s) => normalize_date(s).unwrap_or_else(|| s.clone()),
        other => coerce_text(other),
    }
}

/// Render a number as "$1,234,567" (rounded to whole dollars).
fn format_usd(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let mut magnitude = rounded.abs() as u64;

    let mut groups: Vec<String> = Vec::new();
    loop {
        let group = magnitude % 1000;
        magnitude /= 1000;
        if magnitude == 0 {
            groups.push(group.to_string());
            break;
        }
        groups.push(format!("{:03}", group));
    }
    groups.reverse();

    let body = groups.join(",");
    if negative {
        format!("-${}", body)
    } else {
        format!("${}", body)
    }
}

/// Normalize date-shaped text: RFC 3339 timestamps re-render in canonical
/// UTC form; bare `YYYY-MM-DD` dates pass through validated. Returns None
/// for text that is not a date.
fn normalize_date(text: &str) -> Option<String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(
            ts.with_timezone(&Utc)
                .format("%Y-%m-%dT%H:%M:%SZ")
                .to_string(),
        );
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    None
}

/// Sum a list with lenient numeric coercion: numbers count as themselves,
/// numeric text parses, and everything else counts as 0. A non-list source
/// passes through unchanged.
fn aggregate(source: &FieldValue) -> FieldValue {
    match source {
        FieldValue::List(items) => {
            let sum: f64 = items.iter().map(coerce_number).sum();
            FieldValue::Number(sum)
        }
        other => other.clone(),
    }
}

fn coerce_number(value: &FieldValue) -> f64 {
    match value {
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Coerce any value to text: null is empty, text is bare, the rest render
/// as compact JSON.
fn coerce_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => String::new(),
        FieldValue::Text(s) => s.clone(),
        FieldValue::Bool(b) => b.to_string(),
        other => other.render(),
    }
}
