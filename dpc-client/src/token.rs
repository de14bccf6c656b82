//! Bearer token lifecycle
//!
//! The [`TokenManager`] owns the process-wide [`CredentialCache`]. Client
//! credentials are loaded from the secret provider once, and the bearer token
//! is reused until its cached expiry passes.

use chrono::Utc;
use dpc_core::dto::token::{ClientCredentialsRequest, TokenResponse};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{AuthError, describe_transport};
use crate::response_text;
use crate::secrets::SecretProvider;

/// Seconds subtracted from the declared token lifetime
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Where the OAuth client credentials live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretLocation {
    /// Secret name or ARN
    pub secret_id: String,
    /// Region the secret is stored in
    pub region: String,
    /// Payload field holding the client identifier
    pub client_id_key: String,
    /// Payload field holding the client secret
    pub client_secret_key: String,
}

impl SecretLocation {
    pub const DEFAULT_CLIENT_ID_KEY: &'static str = "MATILLION_CLIENT_ID";
    pub const DEFAULT_CLIENT_SECRET_KEY: &'static str = "MATILLION_CLIENT_SECRET";

    /// Location with the default payload field names
    pub fn new(secret_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            region: region.into(),
            client_id_key: Self::DEFAULT_CLIENT_ID_KEY.to_string(),
            client_secret_key: Self::DEFAULT_CLIENT_SECRET_KEY.to_string(),
        }
    }

    pub fn with_keys(
        mut self,
        client_id_key: impl Into<String>,
        client_secret_key: impl Into<String>,
    ) -> Self {
        self.client_id_key = client_id_key.into();
        self.client_secret_key = client_secret_key.into();
        self
    }
}

/// Resolved client credentials and the current bearer token
///
/// Lazily populated and never invalidated except by expiry comparison.
#[derive(Debug, Clone, Default)]
pub struct CredentialCache {
    client_id: Option<String>,
    client_secret: Option<String>,
    access_token: Option<String>,
    /// Epoch seconds after which the token must not be used
    expires_at: Option<i64>,
}

impl CredentialCache {
    fn credentials(&self) -> Option<(String, String)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some((id.clone(), secret.clone())),
            _ => None,
        }
    }

    /// The cached token while `now < expires_at`
    fn valid_token(&self, now: i64) -> Option<&str> {
        match (&self.access_token, self.expires_at) {
            (Some(token), Some(expires_at)) if now < expires_at => Some(token),
            _ => None,
        }
    }

    fn store_token(&mut self, token: TokenResponse, now: i64) -> i64 {
        let expires_at = now
            .saturating_add(token.expires_in)
            .saturating_sub(EXPIRY_MARGIN_SECS);
        self.access_token = Some(token.access_token);
        self.expires_at = Some(expires_at);
        expires_at
    }
}

/// Obtains and refreshes the bearer token for the DPC API
///
/// Built once per process and shared by reference. The cache lock is held
/// across a refresh, so concurrent callers wait for the same exchange.
pub struct TokenManager {
    client: Client,
    token_url: String,
    secrets: Arc<dyn SecretProvider>,
    location: SecretLocation,
    cache: Mutex<CredentialCache>,
}

impl TokenManager {
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        secrets: Arc<dyn SecretProvider>,
        location: SecretLocation,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            secrets,
            location,
            cache: Mutex::new(CredentialCache::default()),
        }
    }

    /// Expiry of the cached token in epoch seconds, if one is cached
    pub async fn cached_expiry(&self) -> Option<i64> {
        self.cache.lock().await.expires_at
    }

    /// Returns a valid bearer token
    ///
    /// Performs no network call while the cached token is valid. Otherwise
    /// loads the client credentials (first use only) and exchanges them for
    /// a new token.
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now().timestamp();

        debug!(now, expires_at = ?cache.expires_at, "Checking cached access token");

        if let Some(token) = cache.valid_token(now) {
            debug!("Using cached access token");
            return Ok(token.to_string());
        }

        let (client_id, client_secret) = match cache.credentials() {
            Some(credentials) => credentials,
            None => {
                let (client_id, client_secret) = self.load_credentials().await?;
                cache.client_id = Some(client_id.clone());
                cache.client_secret = Some(client_secret.clone());
                (client_id, client_secret)
            }
        };

        let token = self.exchange(&client_id, &client_secret).await?;
        let access_token = token.access_token.clone();
        let expires_at = cache.store_token(token, Utc::now().timestamp());

        info!(expires_at, "Cached new access token");
        Ok(access_token)
    }

    /// Fetches and parses the client credentials secret
    async fn load_credentials(&self) -> Result<(String, String), AuthError> {
        info!(
            secret_id = %self.location.secret_id,
            region = %self.location.region,
            "Fetching OAuth client credentials"
        );

        let raw = self
            .secrets
            .fetch_secret(&self.location.secret_id, &self.location.region)
            .await?;

        parse_credentials(&raw, &self.location)
    }

    /// Client-credentials exchange against the token endpoint
    async fn exchange(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenResponse, AuthError> {
        info!("Requesting access token");

        let response = self
            .client
            .post(&self.token_url)
            .form(&ClientCredentialsRequest::new(client_id, client_secret))
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(describe_transport(&e)))?;

        if response.status() != StatusCode::OK {
            return Err(AuthError::TokenExchange(response_text(response).await));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::TokenExchange(format!("invalid token response: {}", e)))
    }
}

/// Extracts the two credential fields from a JSON secret payload
fn parse_credentials(
    raw: &str,
    location: &SecretLocation,
) -> Result<(String, String), AuthError> {
    let malformed = |reason: String| AuthError::MalformedSecret {
        secret_id: location.secret_id.clone(),
        reason,
    };

    let payload: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| malformed(format!("payload is not JSON: {}", e)))?;

    let field = |key: &str| {
        payload
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| malformed(format!("missing string field {}", key)))
    };

    Ok((
        field(&location.client_id_key)?,
        field(&location.client_secret_key)?,
    ))
}
