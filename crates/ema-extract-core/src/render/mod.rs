//! Schema-less rendering of extraction results.
//!
//! Nothing here assumes a fixed record type. Arrays, objects and scalars at
//! any depth are walked recursively and laid out as collapsible sections.

mod html;

pub use html::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::indication::{humanize_key, record_title, scalar_text, TITLE_KEYS};

/// One line inside a section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Line {
    /// `label: value`
    Field { label: String, value: String },
    /// `- text`
    Bullet(String),
    /// Free text.
    Text(String),
}

/// A collapsible section with lines and nested sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub title: String,
    /// Whether the section starts open.
    pub expanded: bool,
    pub lines: Vec<Line>,
    pub children: Vec<Section>,
}

impl Section {
    fn new(title: impl Into<String>, expanded: bool) -> Self {
        Self {
            title: title.into(),
            expanded,
            lines: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Total number of sections in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Section::count).sum::<usize>()
    }
}

/// Build the "formatted details" view of a result.
///
/// Arrays get one collapsed section per element, titled from the indication
/// keys when present. Objects get one expanded section per key. A bare scalar
/// becomes a single section.
pub fn formatted_details(value: &Value) -> Vec<Section> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| array_item_section(item, idx))
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                let mut section = Section::new(humanize_key(key), true);
                fill_object_entry(&mut section, value);
                section
            })
            .collect(),
        scalar => {
            let mut section = Section::new("Value", true);
            section.lines.push(Line::Text(scalar_text(scalar)));
            vec![section]
        }
    }
}

fn array_item_section(item: &Value, idx: usize) -> Section {
    match item {
        Value::Object(record) => {
            let mut section = Section::new(record_title(record, idx), false);
            for (key, value) in record {
                if TITLE_KEYS.contains(&key.as_str()) {
                    continue;
                }
                push_labelled(&mut section, &humanize_key(key), value);
            }
            section
        }
        other => {
            let mut section = Section::new(format!("Item {}", idx + 1), false);
            push_value(&mut section, other);
            section
        }
    }
}

/// Body of a top-level object key: lists become bullets, maps become fields.
fn fill_object_entry(section: &mut Section, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(map) => {
                        for (k, v) in map {
                            section.lines.push(Line::Bullet(format!("{}: {}", k, inline(v))));
                        }
                    }
                    other => section.lines.push(Line::Bullet(inline(other))),
                }
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                section.lines.push(Line::Field {
                    label: k.clone(),
                    value: inline(v),
                });
            }
        }
        scalar => section.lines.push(Line::Text(scalar_text(scalar))),
    }
}

/// A labelled value inside a record: scalars stay on one line, collections
/// open a nested section.
fn push_labelled(section: &mut Section, label: &str, value: &Value) {
    match value {
        Value::Array(items) if items.iter().all(is_scalar) => {
            let mut child = Section::new(label, true);
            for item in items {
                child.lines.push(Line::Bullet(scalar_text(item)));
            }
            section.children.push(child);
        }
        Value::Array(_) | Value::Object(_) => {
            let mut child = Section::new(label, true);
            push_value(&mut child, value);
            section.children.push(child);
        }
        scalar => section.lines.push(Line::Field {
            label: label.to_string(),
            value: scalar_text(scalar),
        }),
    }
}

fn push_value(section: &mut Section, value: &Value) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                push_labelled(section, k, v);
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                if is_scalar(item) {
                    section.lines.push(Line::Bullet(scalar_text(item)));
                } else {
                    push_labelled(section, &format!("[{}]", idx), item);
                }
            }
        }
        scalar => section.lines.push(Line::Text(scalar_text(scalar))),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Compact single-line form used where nesting is flattened.
fn inline(value: &Value) -> String {
    if is_scalar(value) {
        scalar_text(value)
    } else {
        value.to_string()
    }
}

/// Render sections as indented plain text.
///
/// `▾` marks sections that start expanded, `▸` collapsed ones. Text output
/// always prints the body.
pub fn render_outline(sections: &[Section]) -> String {
    let mut out = String::new();
    for section in sections {
        write_section(&mut out, section, 0);
    }
    out
}

fn write_section(out: &mut String, section: &Section, depth: usize) {
    let indent = "  ".repeat(depth);
    let marker = if section.expanded { '▾' } else { '▸' };
    out.push_str(&format!("{}{} {}\n", indent, marker, section.title));

    for line in &section.lines {
        match line {
            Line::Field { label, value } => {
                out.push_str(&format!("{}  {}: {}\n", indent, label, indent_continuation(value, depth + 2)));
            }
            Line::Bullet(text) => {
                out.push_str(&format!("{}  - {}\n", indent, indent_continuation(text, depth + 2)));
            }
            Line::Text(text) => {
                out.push_str(&format!("{}  {}\n", indent, indent_continuation(text, depth + 1)));
            }
        }
    }

    for child in &section.children {
        write_section(out, child, depth + 1);
    }
}

/// Keep multi-line values aligned under their label.
fn indent_continuation(text: &str, depth: usize) -> String {
    let pad = format!("\n{}", "  ".repeat(depth));
    text.lines().collect::<Vec<_>>().join(&pad)
}

/// Render the whole value as a key/value tree.
pub fn render_tree(value: &Value) -> String {
    let mut out = String::new();
    write_tree(&mut out, None, value, 0);
    out
}

fn write_tree(out: &mut String, label: Option<&str>, value: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    let prefix = label.map(|l| format!("{}: ", l)).unwrap_or_default();

    match value {
        Value::Array(items) if items.is_empty() => {
            out.push_str(&format!("{}{}[]\n", indent, prefix));
        }
        Value::Object(map) if map.is_empty() => {
            out.push_str(&format!("{}{}{{}}\n", indent, prefix));
        }
        Value::Array(items) => {
            out.push_str(&format!("{}{}[{} items]\n", indent, prefix, items.len()));
            for (idx, item) in items.iter().enumerate() {
                write_tree(out, Some(&idx.to_string()), item, depth + 1);
            }
        }
        Value::Object(map) => {
            out.push_str(&format!("{}{}{{{} keys}}\n", indent, prefix, map.len()));
            for (key, item) in map {
                write_tree(out, Some(key), item, depth + 1);
            }
        }
        scalar => {
            out.push_str(&format!("{}{}{}\n", indent, prefix, scalar));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample_records() -> Value {
        json!([
            {
                "Primary Disease_category": {"value": "Melanoma", "confidence_score": 1.0},
                "Indication #": {"value": 1, "confidence_score": 1.0},
                "Treatment line": {"value": "_", "confidence_score": 1.0},
                "Population": {"value": "Adult, Adolescent", "confidence_score": 1.0}
            },
            {
                "Primary Disease_category": "Renal cell carcinoma (RCC)",
                "Indication #": 2,
                "Treatment_modality": ["Monotherapy", "Combination"]
            }
        ])
    }

    #[test]
    fn test_array_sections_titled_from_record() {
        let sections = formatted_details(&sample_records());
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Melanoma - Indication #1");
        assert_eq!(sections[1].title, "Renal cell carcinoma (RCC) - Indication #2");
        assert!(sections.iter().all(|s| !s.expanded));
    }

    #[test]
    fn test_title_keys_not_repeated() {
        let sections = formatted_details(&sample_records());
        let outline = render_outline(&sections);
        assert!(!outline.contains("Primary Disease Category"));
        assert!(outline.contains("▸ Melanoma - Indication #1"));
    }

    #[test]
    fn test_wrapped_field_becomes_child_section() {
        let sections = formatted_details(&sample_records());
        let population = sections[0]
            .children
            .iter()
            .find(|c| c.title == "Population")
            .unwrap();
        assert!(population.lines.contains(&Line::Field {
            label: "value".into(),
            value: "Adult, Adolescent".into()
        }));
        assert!(population.lines.contains(&Line::Field {
            label: "confidence_score".into(),
            value: "1.0".into()
        }));
    }

    #[test]
    fn test_scalar_list_becomes_bullets() {
        let sections = formatted_details(&sample_records());
        let modality = &sections[1].children[0];
        assert_eq!(modality.title, "Treatment Modality");
        assert_eq!(
            modality.lines,
            vec![Line::Bullet("Monotherapy".into()), Line::Bullet("Combination".into())]
        );
    }

    #[test]
    fn test_object_root_sections() {
        let value = json!({
            "drug_name": "OPDIVO",
            "indications": [{"disease": "Melanoma"}, "misc"],
            "meta": {"source": "EMA"}
        });
        let sections = formatted_details(&value);
        assert_eq!(sections.len(), 3);
        assert!(sections.iter().all(|s| s.expanded));

        let drug = sections.iter().find(|s| s.title == "Drug Name").unwrap();
        assert_eq!(drug.lines, vec![Line::Text("OPDIVO".into())]);

        let indications = sections.iter().find(|s| s.title == "Indications").unwrap();
        assert_eq!(
            indications.lines,
            vec![Line::Bullet("disease: Melanoma".into()), Line::Bullet("misc".into())]
        );

        let meta = sections.iter().find(|s| s.title == "Meta").unwrap();
        assert_eq!(
            meta.lines,
            vec![Line::Field { label: "source".into(), value: "EMA".into() }]
        );
    }

    #[test]
    fn test_scalar_root() {
        let sections = formatted_details(&json!("just text"));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].lines, vec![Line::Text("just text".into())]);
    }

    #[test]
    fn test_empty_collections() {
        assert!(formatted_details(&json!([])).is_empty());
        assert!(formatted_details(&json!({})).is_empty());
        assert_eq!(render_tree(&json!([])), "[]\n");
        assert_eq!(render_tree(&json!({})), "{}\n");
    }

    #[test]
    fn test_array_of_scalars() {
        let sections = formatted_details(&json!([1, "two", null]));
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[2].title, "Item 3");
        assert_eq!(sections[2].lines, vec![Line::Text("null".into())]);
    }

    #[test]
    fn test_render_tree_nested() {
        let tree = render_tree(&json!({"a": [1, {"b": "x"}]}));
        assert_eq!(tree, "{1 keys}\n  a: [2 items]\n    0: 1\n    1: {1 keys}\n      b: \"x\"\n");
    }

    #[test]
    fn test_outline_multiline_value() {
        let sections = formatted_details(&json!([{"Indication_text": "line one\nline two"}]));
        let outline = render_outline(&sections);
        assert!(outline.contains("  Indication Text: line one\n    line two\n"));
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            any::<f64>()
                .prop_filter("finite", |f| f.is_finite())
                .prop_map(|f| json!(f)),
            ".{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(6, 64, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map(".{0,8}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_render_never_panics(value in arb_json()) {
            let sections = formatted_details(&value);
            let _ = render_outline(&sections);
            let _ = render_tree(&value);
        }
    }
}
