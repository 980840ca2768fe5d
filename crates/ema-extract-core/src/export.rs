//! JSON download of an extraction result.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// File name offered for the download.
pub const DEFAULT_FILE_NAME: &str = "extracted_ema_data.json";

/// Media type of the download.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// A result re-serialized for download.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonDownload {
    /// Suggested file name
    pub file_name: String,
    /// Media type
    pub media_type: String,
    /// Pretty-printed JSON (2-space indent)
    pub body: String,
}

impl JsonDownload {
    /// Serialize a parsed value for download.
    pub fn from_value(value: &Value) -> ExportResult<Self> {
        Ok(Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            media_type: JSON_MEDIA_TYPE.to_string(),
            body: serde_json::to_string_pretty(value)?,
        })
    }

    /// Override the suggested file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Resolve where the download lands: directories get the suggested file
    /// name appended, anything else is taken as the file path.
    pub fn target_path(&self, dest: &Path) -> PathBuf {
        if dest.is_dir() {
            dest.join(&self.file_name)
        } else {
            dest.to_path_buf()
        }
    }

    /// Write the body to `dest` and return the path written.
    pub fn write_to(&self, dest: &Path) -> ExportResult<PathBuf> {
        let path = self.target_path(dest);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &self.body)?;
        info!("Wrote {} ({} bytes, {})", path.display(), self.body.len(), self.media_type);
        Ok(path)
    }

    /// Parse the body back into a value.
    pub fn to_value(&self) -> ExportResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
