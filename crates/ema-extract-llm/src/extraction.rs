//! Indication extraction: send label text, unwrap and parse the completion.

use ema_extract_core::fence::unwrap_code_fence;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::client::{ClientError, GenerationClient};
use crate::prompts::{build_contents, EMA_INDICATIONS_PROMPT};

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("No input text provided")]
    EmptyInput,

    #[error("No credentials supplied")]
    MissingCredentials,

    #[error("Generation failed: {0}")]
    Client(#[from] ClientError),

    #[error("Error parsing JSON response: {source}")]
    MalformedJson {
        #[source]
        source: serde_json::Error,
        /// Raw completion as returned by the model
        raw: String,
    },
}

impl ExtractionError {
    /// Whether the model answered but its text was not JSON.
    pub fn is_malformed_json(&self) -> bool {
        matches!(self, Self::MalformedJson { .. })
    }

    /// Raw completion for malformed-JSON failures.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::MalformedJson { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// A successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Parsed result
    pub value: Value,
    /// Completion as returned by the model
    pub raw: String,
    /// Completion after fence unwrapping
    pub cleaned: String,
}

/// Parse a raw completion, keeping it on failure.
pub fn parse_response(raw: String) -> ExtractionResult<Extraction> {
    let cleaned = unwrap_code_fence(&raw).to_string();

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => Ok(Extraction {
            value,
            raw,
            cleaned,
        }),
        Err(source) => {
            warn!("Completion is not valid JSON: {}", source);
            Err(ExtractionError::MalformedJson { source, raw })
        }
    }
}

/// Runs the extraction instruction against a generation client.
pub struct Extractor<C> {
    client: C,
    prompt: String,
}

impl<C: GenerationClient> Extractor<C> {
    /// Extractor using the built-in instruction.
    pub fn new(client: C) -> Self {
        Self::with_prompt(client, EMA_INDICATIONS_PROMPT)
    }

    pub fn with_prompt(client: C, prompt: impl Into<String>) -> Self {
        Self {
            client,
            prompt: prompt.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// One request: validate input, call the model once, parse the reply.
    pub fn extract(&self, text: &str) -> ExtractionResult<Extraction> {
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        info!(
            "Extracting indications: {} chars of label text, model={}",
            text.len(),
            self.client.model()
        );

        let contents = build_contents(text, &self.prompt);
        let raw = self.client.generate(&contents)?;
        let extraction = parse_response(raw)?;

        let summary = ema_extract_core::summarize(&extraction.value);
        info!(
            "Extraction complete: {} records, {} categories",
            summary.records,
            summary.categories.len()
        );

        Ok(extraction)
    }
}
