//! Google Gemini client for text generation.
//!
//! One blocking `generateContent` call per request, no retries. Works
//! against the Gemini Developer API (API key) or a Vertex AI project
//! (bearer token).

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::credentials::{Credentials, CredentialsError};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_THINKING_BUDGET: u32 = 2500;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Error bodies are cut to this many characters before being surfaced.
const ERROR_BODY_LIMIT: usize = 200;

/// Client errors.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Gemini response contained no text")]
    EmptyResponse,

    #[error("Request serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("No mock response queued")]
    MockExhausted,
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Sampling settings for a generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    /// `None` leaves the model's default thinking behaviour.
    pub thinking_budget: Option<u32>,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            thinking_budget: Some(DEFAULT_THINKING_BUDGET),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Anything that turns a multi-part prompt into a single text completion.
pub trait GenerationClient {
    fn generate(&self, contents: &[String]) -> ClientResult<String>;

    /// Model identifier, for logs and reports.
    fn model(&self) -> &str;
}

// -- Request types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: RequestGenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

// -- Response types --

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

pub struct GeminiClient {
    http: HttpClient,
    credentials: Credentials,
    config: GenerationConfig,
}

impl GeminiClient {
    pub fn new(credentials: Credentials, config: GenerationConfig) -> ClientResult<Self> {
        let http = HttpClient::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            credentials,
            config,
        })
    }

    /// `generateContent` URL for the configured model and credentials.
    pub fn endpoint(&self) -> String {
        match &self.credentials {
            Credentials::ApiKey(_) => {
                format!("{}/{}:generateContent", GEMINI_ENDPOINT, self.config.model)
            }
            Credentials::Vertex {
                project_id,
                location,
                ..
            } => format!(
                "https://{loc}-aiplatform.googleapis.com/v1/projects/{project}/locations/{loc}/publishers/google/models/{model}:generateContent",
                loc = location,
                project = project_id,
                model = self.config.model
            ),
        }
    }

    pub fn build_request_body(
        contents: &[String],
        config: &GenerationConfig,
    ) -> ClientResult<serde_json::Value> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: contents
                    .iter()
                    .map(|text| RequestPart { text: text.as_str() })
                    .collect(),
            }],
            generation_config: RequestGenerationConfig {
                temperature: config.temperature,
                thinking_config: config
                    .thinking_budget
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            },
        };
        Ok(serde_json::to_value(request)?)
    }

    /// Concatenated non-thought text of the first candidate.
    pub fn extract_text(response: &GeminiResponse) -> Option<String> {
        let content = response.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn auth_header(&self) -> ClientResult<(&'static str, HeaderValue)> {
        let (name, value) = match &self.credentials {
            Credentials::ApiKey(key) => ("x-goog-api-key", key.clone()),
            Credentials::Vertex { token, .. } => {
                ("authorization", format!("Bearer {}", token.bearer()?))
            }
        };
        let value = HeaderValue::from_str(&value)
            .map_err(|e| ClientError::InvalidHeader(e.to_string()))?;
        Ok((name, value))
    }
}

impl GenerationClient for GeminiClient {
    fn generate(&self, contents: &[String]) -> ClientResult<String> {
        let url = self.endpoint();
        let body = Self::build_request_body(contents, &self.config)?;
        let (auth_name, auth_value) = self.auth_header()?;

        info!(
            "Gemini generateContent: model={} parts={} chars={}",
            self.config.model,
            contents.len(),
            contents.iter().map(|c| c.len()).sum::<usize>()
        );

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(auth_name, auth_value)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().unwrap_or_default();
            // Truncate error body to avoid leaking sensitive data
            let truncated: String = error_body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: truncated,
            });
        }

        let gemini_response: GeminiResponse = response.json()?;
        let text = Self::extract_text(&gemini_response).ok_or(ClientError::EmptyResponse)?;
        debug!("Gemini completion: {} chars", text.len());

        Ok(text)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Queue of canned completions for tests and offline runs.
#[derive(Default)]
pub struct MockClient {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.push_response(response);
        self
    }

    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response.into());
        }
    }

    /// Contents of every call made so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl GenerationClient for MockClient {
    fn generate(&self, contents: &[String]) -> ClientResult<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(contents.to_vec());
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .ok_or(ClientError::MockExhausted)
    }

    fn model(&self) -> &str {
        "mock"
    }
}
