mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

use commands::{
    run_extract, run_interactive, run_render, run_unwrap, ExtractArgs, InteractiveArgs, RenderArgs,
};
use config::Config;

/// Extract structured indication data from EMA product labels with Gemini
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.ema-extract/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract indications from label text
    Extract(ExtractArgs),
    /// Render a saved JSON result or raw completion
    Render(RenderArgs),
    /// Paste labels one after another in a session
    Interactive(InteractiveArgs),
    /// Print text with Markdown code fences removed
    Unwrap {
        /// Input file ("-" or omitted reads stdin)
        file: Option<PathBuf>,
    },
    /// Write the default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    match cli.command {
        Commands::Extract(args) => run_extract(&args, load_config(&config_path)?),
        Commands::Render(args) => run_render(&args, load_config(&config_path)?),
        Commands::Interactive(args) => run_interactive(&args, load_config(&config_path)?),
        Commands::Unwrap { file } => {
            run_unwrap(file.as_ref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::InitConfig { force } => init_config(&config_path, force),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)?;
    debug!("Config from {}: {:?}", path.display(), config);
    Ok(config)
}

fn init_config(path: &Path, force: bool) -> Result<ExitCode> {
    if path.exists() && !force {
        eprintln!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
        return Ok(ExitCode::FAILURE);
    }
    Config::default().save(path)?;
    info!("Wrote default config to {}", path.display());
    Ok(ExitCode::SUCCESS)
}
