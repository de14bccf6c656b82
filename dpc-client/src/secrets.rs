//! Secret providers
//!
//! A secret provider resolves a named secret to its raw string payload.
//! Parsing the payload into credentials is left to the [`TokenManager`](crate::TokenManager).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::error::{SecretError, describe_transport};
use crate::response_text;

/// Key-value secret store queried by identifier
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Fetches the raw payload of a secret
    ///
    /// # Arguments
    /// * `secret_id` - Name or ARN of the secret
    /// * `region` - Region the secret is stored in
    async fn fetch_secret(&self, secret_id: &str, region: &str) -> Result<String, SecretError>;
}

// =============================================================================
// Secrets Manager extension
// =============================================================================

/// Header carrying the session token expected by the extension
const SESSION_TOKEN_HEADER: &str = "X-Aws-Parameters-Secrets-Token";

/// Default local endpoint of the parameters and secrets extension
pub const DEFAULT_EXTENSION_URL: &str = "http://localhost:2773";

#[derive(Debug, Deserialize)]
struct ExtensionSecretResponse {
    #[serde(rename = "SecretString")]
    secret_string: Option<String>,
}

/// Reads secrets through the locally running Secrets Manager extension
///
/// The extension resolves plain names in its own region; the runner refuses
/// to start when a plain name is configured for another region.
#[derive(Debug, Clone)]
pub struct ExtensionSecretProvider {
    base_url: String,
    client: Client,
    session_token: Option<String>,
}

impl ExtensionSecretProvider {
    pub fn new(base_url: impl Into<String>, client: Client, session_token: Option<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            session_token,
        }
    }
}

#[async_trait]
impl SecretProvider for ExtensionSecretProvider {
    async fn fetch_secret(&self, secret_id: &str, region: &str) -> Result<String, SecretError> {
        let url = format!("{}/secretsmanager/get", self.base_url);
        debug!(secret_id, region, "Requesting secret from extension");

        let mut request = self.client.get(&url).query(&[("secretId", secret_id)]);
        if let Some(token) = &self.session_token {
            request = request.header(SESSION_TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SecretError::access(secret_id, describe_transport(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response_text(response).await;
            if status == StatusCode::NOT_FOUND || body.contains("ResourceNotFoundException") {
                return Err(SecretError::NotFound(secret_id.to_string()));
            }
            return Err(SecretError::access(
                secret_id,
                format!("status {}: {}", status.as_u16(), body),
            ));
        }

        let payload: ExtensionSecretResponse = response
            .json()
            .await
            .map_err(|e| SecretError::access(secret_id, format!("invalid response: {}", e)))?;

        payload
            .secret_string
            .ok_or_else(|| SecretError::access(secret_id, "secret has no SecretString"))
    }
}

// =============================================================================
// Local file
// =============================================================================

/// Reads secrets from a local JSON file of `{ "<secret id>": <payload> }`
///
/// Object payloads are re-serialized; string payloads are returned as-is.
/// The file is read on every fetch.
#[derive(Debug, Clone)]
pub struct FileSecretProvider {
    path: PathBuf,
}

impl FileSecretProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SecretProvider for FileSecretProvider {
    async fn fetch_secret(&self, secret_id: &str, _region: &str) -> Result<String, SecretError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SecretError::access(secret_id, format!("{}: {}", self.path.display(), e))
        })?;

        let secrets: HashMap<String, serde_json::Value> = serde_json::from_str(&contents)
            .map_err(|e| {
                SecretError::access(secret_id, format!("{}: {}", self.path.display(), e))
            })?;

        match secrets.get(secret_id) {
            Some(serde_json::Value::String(raw)) => Ok(raw.clone()),
            Some(value) => Ok(value.to_string()),
            None => Err(SecretError::NotFound(secret_id.to_string())),
        }
    }
}

// =============================================================================
// In memory
// =============================================================================

/// Map-backed provider that counts how often it is queried
#[derive(Debug, Default)]
pub struct InMemorySecretProvider {
    secrets: HashMap<String, String>,
    fetches: AtomicUsize,
}

impl InMemorySecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, secret_id: impl Into<String>, payload: impl Into<String>) -> Self {
        self.secrets.insert(secret_id.into(), payload.into());
        self
    }

    /// Number of `fetch_secret` calls so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretProvider for InMemorySecretProvider {
    async fn fetch_secret(&self, secret_id: &str, _region: &str) -> Result<String, SecretError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(secret_id.to_string()))
    }
}
