//! Runner configuration
//!
//! Deployment-time settings: API region and endpoints, where the OAuth
//! client credentials are stored, and the project registry.

use anyhow::Context;
use dpc_client::SecretLocation;
use dpc_client::secrets::DEFAULT_EXTENSION_URL;
use dpc_core::domain::project::ProjectRegistry;
use std::path::PathBuf;
use std::time::Duration;

/// Where secret payloads are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Secrets Manager extension listening on a local port
    Extension { url: String },
    /// Local JSON file, for running outside the function runtime
    File { path: PathBuf },
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// DPC API region (e.g., "eu1")
    pub region: String,

    /// Base URL of the DPC API, derived from the region unless overridden
    pub api_url: String,

    /// OAuth token endpoint
    pub token_url: String,

    /// Secret holding the client credentials
    pub secret: SecretLocation,

    /// Backend used to read the secret
    pub secret_source: SecretSource,

    /// Project name to identifier mapping
    pub projects: ProjectRegistry,

    /// Timeout applied to every outbound HTTP request
    pub http_timeout: Duration,
}

impl Config {
    pub const DEFAULT_REGION: &'static str = "eu1";
    pub const DEFAULT_SECRET_REGION: &'static str = "eu-west-1";

    /// Creates a new configuration with defaults
    pub fn new(secret_id: String, projects: ProjectRegistry) -> Self {
        Self {
            region: Self::DEFAULT_REGION.to_string(),
            api_url: dpc_client::api_base_url(Self::DEFAULT_REGION),
            token_url: dpc_client::DEFAULT_TOKEN_URL.to_string(),
            secret: SecretLocation::new(secret_id, Self::DEFAULT_SECRET_REGION),
            secret_source: SecretSource::Extension {
                url: DEFAULT_EXTENSION_URL.to_string(),
            },
            projects,
            http_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - DPC_SECRET_NAME (required)
    /// - DPC_PROJECTS (required, JSON object of project name to id)
    /// - DPC_REGION (optional, default: eu1)
    /// - DPC_API_URL (optional, default: derived from DPC_REGION)
    /// - DPC_TOKEN_URL (optional)
    /// - DPC_SECRET_REGION (optional, default: AWS_REGION, then eu-west-1)
    /// - DPC_CLIENT_ID_KEY / DPC_CLIENT_SECRET_KEY (optional)
    /// - DPC_SECRET_PROVIDER (optional, "extension" or "file", default: extension)
    /// - DPC_SECRET_FILE (required when DPC_SECRET_PROVIDER=file)
    /// - DPC_SECRETS_EXTENSION_URL (optional, default: http://localhost:2773)
    /// - DPC_HTTP_TIMEOUT (optional, seconds, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let secret_id = lookup("DPC_SECRET_NAME")
            .ok_or_else(|| anyhow::anyhow!("DPC_SECRET_NAME environment variable not set"))?;

        let projects = lookup("DPC_PROJECTS")
            .ok_or_else(|| anyhow::anyhow!("DPC_PROJECTS environment variable not set"))?;
        let projects = ProjectRegistry::from_json(&projects)
            .context("DPC_PROJECTS must be a JSON object of project name to project id")?;

        let mut config = Self::new(secret_id, projects);

        if let Some(region) = lookup("DPC_REGION") {
            config.api_url = dpc_client::api_base_url(&region);
            config.region = region;
        }

        if let Some(api_url) = lookup("DPC_API_URL") {
            config.api_url = api_url;
        }

        if let Some(token_url) = lookup("DPC_TOKEN_URL") {
            config.token_url = token_url;
        }

        if let Some(region) = lookup("DPC_SECRET_REGION").or_else(|| lookup("AWS_REGION")) {
            config.secret.region = region;
        }

        if let Some(key) = lookup("DPC_CLIENT_ID_KEY") {
            config.secret.client_id_key = key;
        }

        if let Some(key) = lookup("DPC_CLIENT_SECRET_KEY") {
            config.secret.client_secret_key = key;
        }

        config.secret_source = match lookup("DPC_SECRET_PROVIDER").as_deref() {
            None | Some("extension") => SecretSource::Extension {
                url: lookup("DPC_SECRETS_EXTENSION_URL")
                    .unwrap_or_else(|| DEFAULT_EXTENSION_URL.to_string()),
            },
            Some("file") => SecretSource::File {
                path: lookup("DPC_SECRET_FILE").map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("DPC_SECRET_FILE is required when DPC_SECRET_PROVIDER=file")
                })?,
            },
            Some(other) => anyhow::bail!(
                "DPC_SECRET_PROVIDER must be \"extension\" or \"file\", got \"{}\"",
                other
            ),
        };

        if let Some(timeout) = lookup("DPC_HTTP_TIMEOUT") {
            let secs = timeout
                .parse::<u64>()
                .context("DPC_HTTP_TIMEOUT must be a number of seconds")?;
            config.http_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.region.is_empty() {
            anyhow::bail!("region cannot be empty");
        }

        for (name, url) in [("api_url", &self.api_url), ("token_url", &self.token_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.secret.secret_id.is_empty() {
            anyhow::bail!("secret name cannot be empty");
        }

        if self.secret.client_id_key.is_empty() || self.secret.client_secret_key.is_empty() {
            anyhow::bail!("secret field names cannot be empty");
        }

        match &self.secret_source {
            SecretSource::Extension { url }
                if !url.starts_with("http://") && !url.starts_with("https://") =>
            {
                anyhow::bail!("secrets extension url must start with http:// or https://");
            }
            SecretSource::File { path } if path.as_os_str().is_empty() => {
                anyhow::bail!("secret file path cannot be empty");
            }
            _ => {}
        }

        if self.projects.is_empty() {
            anyhow::bail!("at least one project must be configured");
        }

        if self.http_timeout.is_zero() {
            anyhow::bail!("http_timeout must be greater than 0");
        }

        Ok(())
    }

    /// Checks that the secret backend can read from the configured region
    ///
    /// The extension resolves plain names in the region it runs in, so a
    /// different secret region needs the secret's ARN as the identifier.
    pub fn check_secret_region(&self, function_region: Option<&str>) -> anyhow::Result<()> {
        let SecretSource::Extension { .. } = &self.secret_source else {
            return Ok(());
        };

        match function_region {
            Some(function_region)
                if function_region != self.secret.region
                    && !self.secret.secret_id.starts_with("arn:") =>
            {
                anyhow::bail!(
                    "secret {} is configured in region {} but the secrets extension reads \
                     region {}; set DPC_SECRET_NAME to the secret ARN",
                    self.secret.secret_id,
                    self.secret.region,
                    function_region
                )
            }
            _ => Ok(()),
        }
    }
}
