//! Printing and file output for extraction results.

use anyhow::{Context, Result};
use ema_extract_core::render::{formatted_details, render_outline, render_report, render_tree, ReportMeta};
use ema_extract_core::JsonDownload;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::OutputFormat;

/// Render a value in the requested format.
pub fn format_value(value: &Value, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Outline => {
            let sections = formatted_details(value);
            debug!(
                "Rendering {} sections",
                sections.iter().map(|s| s.count()).sum::<usize>()
            );
            render_outline(&sections)
        }
        OutputFormat::Tree => render_tree(value),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
            json.push('\n');
            json
        }
    })
}

pub fn print_value<W: Write>(out: &mut W, value: &Value, format: OutputFormat) -> Result<()> {
    out.write_all(format_value(value, format)?.as_bytes())
        .context("Failed to write output")
}

/// Write the JSON download to `dest` (a file path or a directory).
pub fn write_download(value: &Value, dest: &Path) -> Result<PathBuf> {
    let download = JsonDownload::from_value(value).context("Failed to serialize result")?;
    download
        .write_to(dest)
        .with_context(|| format!("Failed to write {}", dest.display()))
}

/// Write the HTML report to `path`.
pub fn write_html(value: &Value, meta: &ReportMeta, path: &Path) -> Result<()> {
    let html = render_report(value, meta);
    std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote HTML report to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_json_is_pretty() {
        let out = format_value(&json!({"a": [1]}), OutputFormat::Json).unwrap();
        assert_eq!(out, "{\n  \"a\": [\n    1\n  ]\n}\n");
    }

    #[test]
    fn test_format_outline_and_tree() {
        let value = json!([{"Primary Disease_category": "Melanoma", "Indication #": 1}]);
        assert_eq!(
            format_value(&value, OutputFormat::Outline).unwrap(),
            "▸ Melanoma - Indication #1\n"
        );
        assert!(format_value(&value, OutputFormat::Tree).unwrap().starts_with("[1 items]\n"));
    }

    #[test]
    fn test_write_download_and_html() {
        let dir = tempfile::tempdir().unwrap();
        let value = json!([{"a": 1}]);

        let path = write_download(&value, dir.path()).unwrap();
        assert!(path.ends_with("extracted_ema_data.json"));

        let html_path = dir.path().join("report.html");
        write_html(&value, &ReportMeta::default(), &html_path).unwrap();
        assert!(std::fs::read_to_string(html_path).unwrap().contains("<details>"));
    }
}
