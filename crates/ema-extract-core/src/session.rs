//! Session state for interactive use.
//!
//! Holds the last successful extraction. A failed request never touches it,
//! so the previous result stays available until a new one succeeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::indication::{summarize, ExtractionSummary};

/// Hex SHA-256 of the submitted source text.
pub fn source_digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// A successful extraction kept by the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionRecord {
    pub id: Uuid,
    pub completed_at: DateTime<Utc>,
    /// SHA-256 of the text that produced this result
    pub source_digest: String,
    pub value: Value,
}

impl ExtractionRecord {
    pub fn new(value: Value, source_text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            completed_at: Utc::now(),
            source_digest: source_digest(source_text),
            value,
        }
    }

    pub fn summary(&self) -> ExtractionSummary {
        summarize(&self.value)
    }
}

/// Per-session state owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct Session {
    last: Option<ExtractionRecord>,
    credentials_loaded: bool,
    failures: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_credentials_loaded(&mut self, loaded: bool) {
        self.credentials_loaded = loaded;
    }

    pub fn credentials_loaded(&self) -> bool {
        self.credentials_loaded
    }

    /// Replace the last result.
    pub fn record_success(&mut self, value: Value, source_text: &str) -> &ExtractionRecord {
        let record = ExtractionRecord::new(value, source_text);
        debug!("Session result replaced: id={} digest={}", record.id, record.source_digest);
        self.last.insert(record)
    }

    /// Note a failed request. The last result is kept.
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn last(&self) -> Option<&ExtractionRecord> {
        self.last.as_ref()
    }

    pub fn failures(&self) -> usize {
        self.failures
    }
}
