use anyhow::{Context, Result};
use clap::Args;
use ema_extract_core::render::ReportMeta;
use ema_extract_core::Session;
use ema_extract_llm::{Credentials, ExtractionError, Extractor, GeminiClient, GenerationClient};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use super::{report_failure, resolve_credentials, resolve_prompt};
use crate::config::{Config, OutputFormat};
use crate::output::{print_value, write_download, write_html};

const HELP: &str = "\
Paste label text, then a line containing only `.` to extract.
Commands:
  :credentials PATH   load a credentials JSON file
  :show               print the last result
  :json               print the last result as JSON
  :save [PATH]        write the last result as JSON (default: current directory)
  :html PATH          write the last result as an HTML report
  :help               show this help
  :quit               exit";

/// Arguments for `ema-extract interactive`
#[derive(Args, Debug)]
pub struct InteractiveArgs {
    /// Gemini API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Credentials JSON file
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Replacement instruction file
    #[arg(long)]
    pub prompt: Option<PathBuf>,

    /// Output format: outline, tree or json
    #[arg(short, long)]
    pub format: Option<OutputFormat>,
}

pub fn run_interactive(args: &InteractiveArgs, mut config: Config) -> Result<ExitCode> {
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    let prompt = resolve_prompt(args.prompt.as_deref(), &config)?;
    let format = args.format.unwrap_or(config.default_format);
    let generation = config.generation_config();

    let mut repl = Repl::new(prompt, format, move |creds: Credentials| {
        GeminiClient::new(creds, generation.clone()).context("Failed to create HTTP client")
    });

    match resolve_credentials(args.api_key.as_deref(), args.credentials.as_deref(), &config) {
        Ok(Some(creds)) => repl.load_credentials(creds)?,
        Ok(None) => info!("No credentials yet; use :credentials PATH"),
        Err(e) => warn!("{:#}", e),
    }

    let stdin = std::io::stdin();
    repl.run(stdin.lock(), &mut std::io::stdout())?;
    Ok(ExitCode::SUCCESS)
}

/// Line-oriented session: pasted blocks are extracted, `:` lines are commands.
pub struct Repl<C, F> {
    session: Session,
    extractor: Option<Extractor<C>>,
    connect: F,
    prompt: String,
    format: OutputFormat,
}

impl<C, F> Repl<C, F>
where
    C: GenerationClient,
    F: FnMut(Credentials) -> Result<C>,
{
    pub fn new(prompt: String, format: OutputFormat, connect: F) -> Self {
        Self {
            session: Session::new(),
            extractor: None,
            connect,
            prompt,
            format,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn load_credentials(&mut self, credentials: Credentials) -> Result<()> {
        info!("Using {}", credentials.describe());
        let client = (self.connect)(credentials)?;
        self.extractor = Some(Extractor::with_prompt(client, self.prompt.clone()));
        self.session.set_credentials_loaded(true);
        Ok(())
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        writeln!(out, "{}", HELP)?;
        let mut buffer = String::new();

        for line in input.lines() {
            let line = line.context("Failed to read input")?;

            if buffer.is_empty() && line.starts_with(':') {
                if !self.command(&line, out)? {
                    return Ok(());
                }
                continue;
            }

            if line.trim() == "." {
                let text = std::mem::take(&mut buffer);
                self.submit(&text, out)?;
                continue;
            }

            buffer.push_str(&line);
            buffer.push('\n');
        }

        // EOF submits whatever was pasted
        if !buffer.trim().is_empty() {
            self.submit(&buffer, out)?;
        }
        Ok(())
    }

    fn submit<W: Write>(&mut self, text: &str, out: &mut W) -> Result<()> {
        let Some(extractor) = &self.extractor else {
            report_failure(&ExtractionError::MissingCredentials, out)?;
            self.session.record_failure();
            return Ok(());
        };

        match extractor.extract(text) {
            Ok(extraction) => {
                let record = self.session.record_success(extraction.value, text);
                let summary = record.summary();
                writeln!(
                    out,
                    "Extracted {} records ({} categories).",
                    summary.records,
                    summary.categories.len()
                )?;
                print_value(out, &record.value, self.format)?;
            }
            Err(err) => {
                report_failure(&err, out)?;
                self.session.record_failure();
            }
        }
        Ok(())
    }

    /// Returns `false` on `:quit`.
    fn command<W: Write>(&mut self, line: &str, out: &mut W) -> Result<bool> {
        let mut parts = line.splitn(2, char::is_whitespace);
        let cmd = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());

        match cmd {
            ":quit" | ":q" => return Ok(false),
            ":help" => writeln!(out, "{}", HELP)?,
            ":credentials" => match arg {
                Some(path) => {
                    let loaded = Credentials::from_file(Path::new(path))
                        .map_err(anyhow::Error::from)
                        .and_then(|creds| self.load_credentials(creds));
                    match loaded {
                        Ok(()) => writeln!(out, "Credentials file loaded successfully.")?,
                        Err(e) => writeln!(out, "Error loading credentials: {:#}", e)?,
                    }
                }
                None => writeln!(out, "Usage: :credentials PATH")?,
            },
            ":show" | ":json" => match self.session.last() {
                Some(record) => {
                    let format = if cmd == ":json" { OutputFormat::Json } else { self.format };
                    print_value(out, &record.value, format)?;
                }
                None => writeln!(out, "No extraction yet.")?,
            },
            ":save" => match self.session.last() {
                Some(record) => {
                    let dest = PathBuf::from(arg.unwrap_or("."));
                    match write_download(&record.value, &dest) {
                        Ok(path) => writeln!(out, "Saved {}", path.display())?,
                        Err(e) => writeln!(out, "{:#}", e)?,
                    }
                }
                None => writeln!(out, "No extraction yet.")?,
            },
            ":html" => match (self.session.last(), arg) {
                (Some(record), Some(path)) => {
                    let meta = ReportMeta {
                        generated_at: record.completed_at,
                        model: self.extractor.as_ref().map(|e| e.client().model().to_string()),
                        source_digest: Some(record.source_digest.clone()),
                        ..ReportMeta::default()
                    };
                    match write_html(&record.value, &meta, Path::new(path)) {
                        Ok(()) => writeln!(out, "Saved {}", path)?,
                        Err(e) => writeln!(out, "{:#}", e)?,
                    }
                }
                (None, _) => writeln!(out, "No extraction yet.")?,
                (_, None) => writeln!(out, "Usage: :html PATH")?,
            },
            other => writeln!(out, "Unknown command {}; type :help", other)?,
        }

        Ok(true)
    }
}
