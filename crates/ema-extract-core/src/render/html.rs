//! Standalone HTML report.
//!
//! Two panes: the pretty-printed JSON and the formatted details as nested
//! `<details>` elements, which browsers render as collapsible sections.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{formatted_details, Line, Section};

/// Header information shown above the result.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub model: Option<String>,
    pub source_digest: Option<String>,
}

impl Default for ReportMeta {
    fn default() -> Self {
        Self {
            title: "Extracted Information".to_string(),
            generated_at: Utc::now(),
            model: None,
            source_digest: None,
        }
    }
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem; color: #212529; }
.columns { display: flex; gap: 2rem; align-items: flex-start; }
.columns > section { flex: 1; min-width: 0; }
pre { background: #f8f9fa; padding: 1rem; overflow-x: auto; white-space: pre-wrap; }
details { border: 1px solid #dee2e6; border-radius: 4px; margin: 0.4rem 0; padding: 0.3rem 0.6rem; }
summary { font-weight: 600; cursor: pointer; }
.meta { color: #6c757d; font-size: 0.9rem; }
"#;

/// Render a complete HTML page for an extraction result.
pub fn render_report(value: &Value, meta: &ReportMeta) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    let sections = formatted_details(value);

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(&meta.title)));
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&meta.title)));

    html.push_str("<p class=\"meta\">");
    html.push_str(&format!("Generated {}", meta.generated_at.to_rfc3339()));
    if let Some(model) = &meta.model {
        html.push_str(&format!(" &middot; model {}", escape_html(model)));
    }
    if let Some(digest) = &meta.source_digest {
        html.push_str(&format!(" &middot; source sha256 {}", escape_html(digest)));
    }
    html.push_str("</p>\n");

    html.push_str("<div class=\"columns\">\n<section>\n<h2>JSON View</h2>\n");
    html.push_str(&format!("<pre>{}</pre>\n</section>\n", escape_html(&pretty)));

    html.push_str("<section>\n<h2>Formatted Details</h2>\n");
    for section in &sections {
        write_details(&mut html, section);
    }
    html.push_str("</section>\n</div>\n</body>\n</html>\n");

    html
}

fn write_details(html: &mut String, section: &Section) {
    let open = if section.expanded { " open" } else { "" };
    html.push_str(&format!(
        "<details{}><summary>{}</summary>\n",
        open,
        escape_html(&section.title)
    ));

    // consecutive bullets share one list; other lines keep their position
    let mut in_list = false;
    for line in &section.lines {
        let is_bullet = matches!(line, Line::Bullet(_));
        if is_bullet && !in_list {
            html.push_str("<ul>\n");
        } else if !is_bullet && in_list {
            html.push_str("</ul>\n");
        }
        in_list = is_bullet;

        match line {
            Line::Field { label, value } => html.push_str(&format!(
                "<p><strong>{}:</strong> {}</p>\n",
                escape_html(label),
                escape_html(value)
            )),
            Line::Text(text) => html.push_str(&format!("<p>{}</p>\n", escape_html(text))),
            Line::Bullet(text) => html.push_str(&format!("<li>{}</li>\n", escape_html(text))),
        }
    }
    if in_list {
        html.push_str("</ul>\n");
    }

    for child in &section.children {
        write_details(html, child);
    }

    html.push_str("</details>\n");
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
        assert_eq!(escape_html("PD-L1 ≥ 1%"), "PD-L1 ≥ 1%");
    }

    #[test]
    fn test_report_structure() {
        let value = json!([
            {"Primary Disease_category": "Melanoma", "Indication #": 1, "Population": "Adult"}
        ]);
        let meta = ReportMeta {
            model: Some("gemini-2.5-flash".into()),
            ..ReportMeta::default()
        };
        let html = render_report(&value, &meta);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<details><summary>Melanoma - Indication #1</summary>"));
        assert!(html.contains("<p><strong>Population:</strong> Adult</p>"));
        assert!(html.contains("model gemini-2.5-flash"));
        assert!(html.contains("&quot;Primary Disease_category&quot;"));
    }

    #[test]
    fn test_report_escapes_model_output() {
        let value = json!({"note": "<script>alert(1)</script>"});
        let html = render_report(&value, &ReportMeta::default());
        assert!(!html.contains("<script>"));
        assert!(html.contains("<details open><summary>Note</summary>"));
    }

    #[test]
    fn test_report_bullets() {
        let value = json!({"tags": ["a", "b"]});
        let html = render_report(&value, &ReportMeta::default());
        assert!(html.contains("<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n"));
    }

    #[test]
    fn test_mixed_lines_keep_order() {
        let section = Section {
            title: "Mixed".into(),
            expanded: true,
            lines: vec![
                Line::Field { label: "First".into(), value: "1".into() },
                Line::Bullet("a".into()),
                Line::Bullet("b".into()),
                Line::Text("between".into()),
                Line::Bullet("c".into()),
            ],
            children: Vec::new(),
        };
        let mut html = String::new();
        write_details(&mut html, &section);

        assert_eq!(
            html,
            "<details open><summary>Mixed</summary>\n\
             <p><strong>First:</strong> 1</p>\n\
             <ul>\n<li>a</li>\n<li>b</li>\n</ul>\n\
             <p>between</p>\n\
             <ul>\n<li>c</li>\n</ul>\n\
             </details>\n"
        );
    }
}
