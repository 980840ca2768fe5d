//! Indication record helpers.
//!
//! The extraction prompt asks the model for an array of indication records.
//! Nothing here enforces that shape: these helpers only read it when it is
//! present, for titles and summaries.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub const PRIMARY_DISEASE_CATEGORY: &str = "Primary Disease_category";
pub const DISEASE_LEVEL_FULL_TEXT: &str = "Disease_level_full_text";
pub const INDICATION_NUMBER: &str = "Indication #";
pub const INDICATION_TEXT: &str = "Indication_text";
pub const TREATMENT_LINE: &str = "Treatment line";
pub const TREATMENT_MODALITY: &str = "Treatment modality";
pub const POPULATION: &str = "Population";
/// Spelled as the prompt spells it.
pub const DISEASE_SUBTYPES: &str = "Disease + sybtypes";

/// Keys that make up a record's title and are not repeated in its body.
pub const TITLE_KEYS: [&str; 2] = [PRIMARY_DISEASE_CATEGORY, INDICATION_NUMBER];

/// Placeholder the prompt uses for "not stated".
pub const NOT_STATED: &str = "_";

/// A field that may be a bare value or wrapped with a confidence score.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredField {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Value>,
}

impl ScoredField {
    /// Read a field from either form.
    pub fn from_value(raw: &Value) -> Self {
        match raw {
            Value::Object(map) if map.contains_key("value") => Self {
                value: map.get("value").cloned().unwrap_or(Value::Null),
                confidence_score: map.get("confidence_score").and_then(Value::as_f64),
                evidence: map.get("evidence").cloned(),
            },
            other => Self {
                value: other.clone(),
                confidence_score: None,
                evidence: None,
            },
        }
    }

    /// True when the model reported the field as not stated.
    pub fn is_not_stated(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::String(s) => s.trim() == NOT_STATED || s.trim().is_empty(),
            _ => false,
        }
    }
}

impl<'de> Deserialize<'de> for ScoredField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&raw))
    }
}

/// Unwrap `{"value": x, ...}` to `x`; anything else is returned as is.
pub fn field_value(raw: &Value) -> &Value {
    match raw {
        Value::Object(map) => map.get("value").unwrap_or(raw),
        other => other,
    }
}

/// Display form of a scalar. Strings are shown without quotes.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Turn a JSON key into a label: underscores become spaces, words are title-cased.
pub fn humanize_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut out = String::with_capacity(spaced.len());
    let mut at_word_start = true;

    for c in spaced.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }

    out
}

/// Title for the record at `index` in an extraction array.
///
/// `"<category> - Indication #<n>"`, or just the category when no number is
/// present, or `Item <index + 1>` when the category key is absent. A present
/// but blank category is kept as is.
pub fn record_title(record: &Map<String, Value>, index: usize) -> String {
    let category = record
        .get(PRIMARY_DISEASE_CATEGORY)
        .map(field_value)
        .map(scalar_text)
        .unwrap_or_else(|| format!("Item {}", index + 1));

    match record
        .get(INDICATION_NUMBER)
        .map(field_value)
        .filter(|v| !is_blank(v))
    {
        Some(number) => format!("{} - Indication #{}", category, scalar_text(number)),
        None => category,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Counts reported after an extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractionSummary {
    /// Number of top-level records (1 for a single object, 0 for scalars)
    pub records: usize,
    /// Distinct primary disease categories, sorted
    pub categories: Vec<String>,
}

/// Summarize an extraction result without assuming its schema.
pub fn summarize(value: &Value) -> ExtractionSummary {
    let records: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    };

    let categories: BTreeSet<String> = records
        .iter()
        .filter_map(|r| r.as_object())
        .filter_map(|r| r.get(PRIMARY_DISEASE_CATEGORY))
        .map(field_value)
        .filter(|v| !is_blank(v))
        .map(scalar_text)
        .collect();

    ExtractionSummary {
        records: records.len(),
        categories: categories.into_iter().collect(),
    }
}
