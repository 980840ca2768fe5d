//! Credentials for the generation API.
//!
//! A Gemini API key goes out as a header. Vertex AI needs a bearer token,
//! either pasted in a credentials file or minted from a Google Cloud service
//! account key (the file `GOOGLE_APPLICATION_CREDENTIALS` points at).

use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::debug;

/// Environment variable holding a Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable naming a Google Cloud credentials file.
pub const APPLICATION_CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Environment variable overriding the Vertex AI region.
pub const REGION_ENV: &str = "GOOGLE_CLOUD_REGION";

pub const DEFAULT_LOCATION: &str = "us-central1";

/// OAuth scope requested for service-account tokens.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const SERVICE_ACCOUNT: &str = "service_account";

/// Credential errors.
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Credentials IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credentials file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to obtain access token: {0}")]
    Auth(#[from] gcp_auth::Error),

    #[error("Unsupported credentials type `{0}`; use a service account key, an access token or an API key")]
    UnsupportedType(String),

    #[error("Credentials file needs `api_key`, `project_id` + `access_token`, or a complete service account key")]
    Incomplete,

    #[error("API key is empty")]
    EmptyKey,
}

pub type CredentialsResult<T> = Result<T, CredentialsError>;

/// How requests authenticate.
#[derive(Clone, PartialEq)]
pub enum Credentials {
    /// Gemini Developer API key, sent as `x-goog-api-key`.
    ApiKey(String),
    /// Vertex AI project with a bearer token.
    Vertex {
        project_id: String,
        location: String,
        token: AccessToken,
    },
}

/// Where Vertex bearer tokens come from.
#[derive(Clone)]
pub enum AccessToken {
    /// Token minted elsewhere, e.g. `gcloud auth print-access-token`.
    Static(String),
    /// Service account key. Tokens are minted on first use and cached until
    /// they expire.
    ServiceAccount(Arc<ServiceAccountKey>),
}

impl AccessToken {
    /// Current bearer token.
    pub fn bearer(&self) -> CredentialsResult<String> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::ServiceAccount(key) => key.token(),
        }
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Static(a), Self::Static(b)) => a == b,
            (Self::ServiceAccount(a), Self::ServiceAccount(b)) => {
                a.client_email == b.client_email && a.key_json == b.key_json
            }
            _ => false,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => f.debug_tuple("Static").field(&"<redacted>").finish(),
            Self::ServiceAccount(key) => f
                .debug_tuple("ServiceAccount")
                .field(&key.client_email)
                .finish(),
        }
    }
}

/// A service account key file and its lazily built token minter.
pub struct ServiceAccountKey {
    client_email: String,
    key_json: String,
    minter: Mutex<Option<TokenMinter>>,
}

struct TokenMinter {
    runtime: tokio::runtime::Runtime,
    account: CustomServiceAccount,
}

impl TokenMinter {
    fn new(key_json: &str) -> CredentialsResult<Self> {
        let account = CustomServiceAccount::from_json(key_json)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime, account })
    }
}

impl ServiceAccountKey {
    fn new(client_email: String, key_json: String) -> Self {
        Self {
            client_email,
            key_json,
            minter: Mutex::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Mint (or reuse) a cloud-platform access token.
    pub fn token(&self) -> CredentialsResult<String> {
        let mut slot = self.minter.lock().unwrap_or_else(PoisonError::into_inner);
        let minter = match slot.take() {
            Some(minter) => minter,
            None => TokenMinter::new(&self.key_json)?,
        };

        let token = minter
            .runtime
            .block_on(minter.account.token(&[CLOUD_PLATFORM_SCOPE]));
        *slot = Some(minter);

        let token = token?;
        debug!("Access token ready for {}", self.client_email);
        Ok(token.as_str().to_string())
    }
}

/// On-disk form of a credentials file.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(rename = "type")]
    kind: Option<String>,
    api_key: Option<String>,
    project_id: Option<String>,
    location: Option<String>,
    access_token: Option<String>,
    client_email: Option<String>,
    private_key: Option<String>,
}

impl Credentials {
    /// Build API key credentials, rejecting blank keys.
    pub fn api_key(key: &str) -> CredentialsResult<Self> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CredentialsError::EmptyKey);
        }
        Ok(Self::ApiKey(key.to_string()))
    }

    /// Read an API key from `GEMINI_API_KEY`, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV)
            .ok()
            .and_then(|key| Self::api_key(&key).ok())
    }

    /// Load the file named by `GOOGLE_APPLICATION_CREDENTIALS`, if set.
    pub fn from_application_default() -> CredentialsResult<Option<Self>> {
        match std::env::var_os(APPLICATION_CREDENTIALS_ENV) {
            Some(path) if !path.is_empty() => Self::from_file(Path::new(&path)).map(Some),
            _ => Ok(None),
        }
    }

    /// Load credentials from a JSON file.
    pub fn from_file(path: &Path) -> CredentialsResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a credentials file.
    ///
    /// Accepts `{"api_key": ...}`, a Google Cloud service account key, or
    /// `{"project_id": ..., "access_token": ..., "location": ...}`. For Vertex
    /// the location falls back to `GOOGLE_CLOUD_REGION`, then `us-central1`.
    pub fn from_json(content: &str) -> CredentialsResult<Self> {
        let file: CredentialsFile = serde_json::from_str(content)?;

        if let Some(key) = file.api_key.as_deref() {
            return Self::api_key(key);
        }

        let location = file
            .location
            .or_else(|| std::env::var(REGION_ENV).ok())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        match file.kind.as_deref() {
            Some(SERVICE_ACCOUNT) => match (file.project_id, file.client_email, file.private_key) {
                (Some(project_id), Some(client_email), Some(_)) => Ok(Self::Vertex {
                    project_id,
                    location,
                    token: AccessToken::ServiceAccount(Arc::new(ServiceAccountKey::new(
                        client_email,
                        content.to_string(),
                    ))),
                }),
                _ => Err(CredentialsError::Incomplete),
            },
            Some(other) if file.access_token.is_none() => {
                Err(CredentialsError::UnsupportedType(other.to_string()))
            }
            _ => match (file.project_id, file.access_token) {
                (Some(project_id), Some(access_token)) if !access_token.trim().is_empty() => {
                    Ok(Self::Vertex {
                        project_id,
                        location,
                        token: AccessToken::Static(access_token.trim().to_string()),
                    })
                }
                _ => Err(CredentialsError::Incomplete),
            },
        }
    }

    /// Short description for logs, without secrets.
    pub fn describe(&self) -> String {
        match self {
            Self::ApiKey(_) => "Gemini API key".to_string(),
            Self::Vertex {
                project_id,
                location,
                token: AccessToken::ServiceAccount(key),
            } => format!(
                "Vertex AI project {} ({}) as {}",
                project_id, location, key.client_email
            ),
            Self::Vertex {
                project_id,
                location,
                ..
            } => format!("Vertex AI project {} ({})", project_id, location),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.debug_tuple("ApiKey").field(&"<redacted>").finish(),
            Self::Vertex {
                project_id,
                location,
                token,
            } => f
                .debug_struct("Vertex")
                .field("project_id", project_id)
                .field("location", location)
                .field("token", token)
                .finish(),
        }
    }
}
