use anyhow::{Context, Result};
use clap::Args;
use ema_extract_core::render::ReportMeta;
use ema_extract_core::source_digest;
use ema_extract_llm::{ExtractionError, Extractor, GeminiClient, GenerationClient};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use super::{download_target, read_input, report_failure, resolve_credentials, resolve_prompt};
use crate::config::{Config, OutputFormat};
use crate::output::{print_value, write_download, write_html};

/// Arguments for `ema-extract extract`
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Label text file ("-" or omitted reads stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Gemini API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Credentials JSON file (API key or Vertex project + access token)
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Thinking budget in tokens
    #[arg(long, conflicts_with = "no_thinking")]
    pub thinking_budget: Option<u32>,

    /// Send no thinking budget
    #[arg(long)]
    pub no_thinking: bool,

    /// Replacement instruction file
    #[arg(long)]
    pub prompt: Option<PathBuf>,

    /// Write the JSON download to this file or directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write an HTML report to this file
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Output format: outline, tree or json
    #[arg(short, long)]
    pub format: Option<OutputFormat>,
}

impl ExtractArgs {
    /// Fold flags over the loaded config
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if self.no_thinking {
            config.thinking_budget = None;
        } else if let Some(budget) = self.thinking_budget {
            config.thinking_budget = Some(budget);
        }
        if let Some(format) = self.format {
            config.default_format = format;
        }
    }
}

pub fn run_extract(args: &ExtractArgs, mut config: Config) -> Result<ExitCode> {
    args.apply_to(&mut config);

    let text = read_input(args.input.as_ref())?;
    let prompt = resolve_prompt(args.prompt.as_deref(), &config)?;
    let credentials =
        resolve_credentials(args.api_key.as_deref(), args.credentials.as_deref(), &config)?;

    let stderr = &mut std::io::stderr();
    let Some(credentials) = credentials else {
        report_failure(&ExtractionError::MissingCredentials, stderr)?;
        return Ok(ExitCode::FAILURE);
    };

    let client = GeminiClient::new(credentials, config.generation_config())
        .context("Failed to create HTTP client")?;
    let extractor = Extractor::with_prompt(client, prompt);

    let ok = extract_and_emit(&extractor, &text, args, &config, &mut std::io::stdout(), stderr)?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Run one extraction and write every requested output. Returns `false` when
/// the extraction failed and the failure was reported to `err_out`.
pub fn extract_and_emit<C, W, E>(
    extractor: &Extractor<C>,
    text: &str,
    args: &ExtractArgs,
    config: &Config,
    out: &mut W,
    err_out: &mut E,
) -> Result<bool>
where
    C: GenerationClient,
    W: Write,
    E: Write,
{
    let extraction = match extractor.extract(text) {
        Ok(extraction) => extraction,
        Err(err) => {
            error!("Extraction failed: {}", err);
            report_failure(&err, err_out)?;
            return Ok(false);
        }
    };

    print_value(out, &extraction.value, config.default_format)?;

    if let Some(dest) = download_target(args.output.as_ref(), config) {
        let path = write_download(&extraction.value, &dest)?;
        info!("Saved extracted JSON to {}", path.display());
    }

    if let Some(html) = &args.html {
        let meta = ReportMeta {
            model: Some(extractor.client().model().to_string()),
            source_digest: Some(source_digest(text)),
            ..ReportMeta::default()
        };
        write_html(&extraction.value, &meta, html)?;
    }

    Ok(true)
}
