//! DPC HTTP Client
//!
//! Talks to the three external services the trigger depends on:
//! - the secret store holding the OAuth client credentials
//! - the identity provider issuing client-credentials bearer tokens
//! - the DPC pipeline execution API
//!
//! # Example
//!
//! ```no_run
//! use dpc_client::{DpcClient, InMemorySecretProvider, SecretLocation, TokenManager};
//! use dpc_core::domain::project::ProjectRegistry;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let http = dpc_client::http_client(Duration::from_secs(30))?;
//! let secrets = Arc::new(InMemorySecretProvider::new().with_secret(
//!     "dpc-api",
//!     r#"{"MATILLION_CLIENT_ID":"id","MATILLION_CLIENT_SECRET":"secret"}"#,
//! ));
//! let tokens = TokenManager::new(
//!     http.clone(),
//!     dpc_client::DEFAULT_TOKEN_URL,
//!     secrets,
//!     SecretLocation::new("dpc-api", "eu-west-1"),
//! );
//!
//! let projects = ProjectRegistry::new().with_project("My first project", "c28506c2");
//! let client = DpcClient::with_client(dpc_client::api_base_url("eu1"), projects, http);
//!
//! let token = tokens.get_access_token().await?;
//! let message = dpc_core::domain::message::QueueMessage::from_body(
//!     r#"{"projectName":"My first project","environmentName":"dev","pipelineName":"daily"}"#,
//! )?;
//! let response = client
//!     .trigger_pipeline(&token, &message.project_name, &message.execution())
//!     .await?;
//! println!("{}", response);
//! # Ok(())
//! # }
//! ```

pub mod error;
mod pipelines;
pub mod secrets;
pub mod token;

// Re-export commonly used types
pub use error::{AuthError, SecretError, TriggerError};
pub use secrets::{
    ExtensionSecretProvider, FileSecretProvider, InMemorySecretProvider, SecretProvider,
};
pub use token::{CredentialCache, SecretLocation, TokenManager};

use dpc_core::domain::project::ProjectRegistry;
use reqwest::Client;
use std::time::Duration;

/// OAuth token endpoint of the identity provider
pub const DEFAULT_TOKEN_URL: &str = "https://id.core.matillion.com/oauth/dpc/token";

/// Base URL of the DPC API for a region (e.g., "eu1", "us1")
pub fn api_base_url(region: &str) -> String {
    format!("https://{}.api.matillion.com/dpc", region)
}

/// Builds the HTTP client shared by every outbound call
///
/// The timeout covers the whole request, connect through body.
pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

/// HTTP client for the DPC pipeline execution API
#[derive(Debug, Clone)]
pub struct DpcClient {
    /// Base URL of the API (e.g., "https://eu1.api.matillion.com/dpc")
    base_url: String,
    /// Project name to identifier lookup
    projects: ProjectRegistry,
    /// HTTP client instance
    client: Client,
}

impl DpcClient {
    /// Create a new client with a default HTTP client
    pub fn new(base_url: impl Into<String>, projects: ProjectRegistry) -> Self {
        Self::with_client(base_url, projects, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        projects: ProjectRegistry,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            projects,
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Reads a response body for error reporting and pass-through
pub(crate) async fn response_text(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = DpcClient::new("https://eu1.api.matillion.com/dpc", ProjectRegistry::new());
        assert_eq!(client.base_url(), "https://eu1.api.matillion.com/dpc");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = DpcClient::new("http://localhost:8080/", ProjectRegistry::new());
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_api_base_url_for_region() {
        assert_eq!(api_base_url("us1"), "https://us1.api.matillion.com/dpc");
    }
}
