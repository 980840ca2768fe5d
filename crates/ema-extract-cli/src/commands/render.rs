use anyhow::{Context, Result};
use clap::Args;
use ema_extract_core::fence::parse_completion;
use ema_extract_core::render::ReportMeta;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use super::{download_target, read_input};
use crate::config::{Config, OutputFormat};
use crate::output::{print_value, write_download, write_html};

/// Arguments for `ema-extract render`
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Saved JSON or raw completion ("-" or omitted reads stdin)
    pub file: Option<PathBuf>,

    /// Output format: outline, tree or json
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Re-write the pretty JSON download to this file or directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write an HTML report to this file
    #[arg(long)]
    pub html: Option<PathBuf>,
}

/// Render a saved result. Fences are stripped first, so raw completions work too.
pub fn run_render(args: &RenderArgs, config: Config) -> Result<ExitCode> {
    let text = read_input(args.file.as_ref())?;
    let ok = render_and_emit(&text, args, &config, &mut std::io::stdout(), &mut std::io::stderr())?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Parse `text` and write every requested output. Returns `false` when the
/// text is not JSON.
pub fn render_and_emit<W: Write, E: Write>(
    text: &str,
    args: &RenderArgs,
    config: &Config,
    out: &mut W,
    err_out: &mut E,
) -> Result<bool> {
    let value = match parse_completion(text) {
        Ok(value) => value,
        Err(e) => {
            error!("Input is not valid JSON: {}", e);
            writeln!(err_out, "Error parsing JSON: {}", e)?;
            return Ok(false);
        }
    };

    let format = args.format.unwrap_or(config.default_format);
    print_value(out, &value, format)?;

    if let Some(dest) = download_target(args.output.as_ref(), config) {
        let path = write_download(&value, &dest).context("Failed to write JSON download")?;
        info!("Saved JSON to {}", path.display());
    }

    if let Some(html) = &args.html {
        let meta = ReportMeta {
            title: args
                .file
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|name| format!("Extracted Information: {}", name.to_string_lossy()))
                .unwrap_or_else(|| ReportMeta::default().title),
            ..ReportMeta::default()
        };
        write_html(&value, &meta, html)?;
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn args() -> RenderArgs {
        RenderArgs {
            file: None,
            format: None,
            output: None,
            html: None,
        }
    }

    #[test]
    fn test_render_falls_back_to_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };

        let (mut out, mut err) = (Vec::new(), Vec::new());
        let ok = render_and_emit("```json\n[{\"a\": 1.5}]\n```", &args(), &config, &mut out, &mut err).unwrap();

        assert!(ok);
        assert_eq!(String::from_utf8(out).unwrap(), "▸ Item 1\n  A: 1.5\n");
        let saved = std::fs::read_to_string(dir.path().join("extracted_ema_data.json")).unwrap();
        let saved: Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(saved, serde_json::json!([{"a": 1.5}]));
    }

    #[test]
    fn test_render_output_flag_wins() {
        let (config_dir, flag_dir) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let config = Config {
            output_dir: Some(config_dir.path().to_path_buf()),
            ..Config::default()
        };
        let args = RenderArgs {
            output: Some(flag_dir.path().to_path_buf()),
            ..args()
        };

        let (mut out, mut err) = (Vec::new(), Vec::new());
        assert!(render_and_emit("[]", &args, &config, &mut out, &mut err).unwrap());
        assert!(flag_dir.path().join("extracted_ema_data.json").exists());
        assert!(!config_dir.path().join("extracted_ema_data.json").exists());
    }

    #[test]
    fn test_render_invalid_json() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let ok = render_and_emit("not json", &args(), &Config::default(), &mut out, &mut err).unwrap();

        assert!(!ok);
        assert!(out.is_empty());
        assert!(String::from_utf8(err).unwrap().starts_with("Error parsing JSON: "));
    }
}
