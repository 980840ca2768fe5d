use anyhow::Result;
use ema_extract_core::fence::{is_fenced, unwrap_code_fence};
use std::path::PathBuf;
use tracing::debug;

use super::read_input;

/// Print a completion with its code fences removed.
pub fn run_unwrap(file: Option<&PathBuf>) -> Result<()> {
    let text = read_input(file)?;
    debug!("Input fenced: {}", is_fenced(&text));
    println!("{}", unwrap_code_fence(&text));
    Ok(())
}
