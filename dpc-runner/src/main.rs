//! DPC Runner
//!
//! Consumes a batch of queued pipeline trigger requests and starts each
//! pipeline through the DPC API.
//!
//! Architecture:
//! - Configuration: Deployment settings from the environment
//! - Event intake: Queue event envelope from a file or stdin
//! - Services: Batch processing with per-record error isolation
//!
//! The batch response is written to stdout as JSON; logs go to stderr.

mod config;
mod event;
mod service;

use anyhow::{Context, Result};
use clap::Parser;
use dpc_client::{
    DpcClient, ExtensionSecretProvider, FileSecretProvider, SecretProvider, TokenManager,
};
use dpc_core::domain::execution::ExecutionResult;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, SecretSource};
use crate::service::{BatchService, StandardBatchService};

#[derive(Parser)]
#[command(name = "dpc-runner")]
#[command(about = "Trigger DPC pipelines from queued job requests", long_about = None)]
struct Cli {
    /// Queue event file; reads stdin when omitted or "-"
    #[arg(long, env = "DPC_EVENT_FILE")]
    event: Option<PathBuf>,

    /// Pretty-print the batch response
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dpc_runner=info,dpc_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    config.check_secret_region(std::env::var("AWS_REGION").ok().as_deref())?;
    info!(
        "Loaded configuration: region={}, api_url={}, projects={}",
        config.region,
        config.api_url,
        config.projects.len()
    );

    let http =
        dpc_client::http_client(config.http_timeout).context("Failed to build HTTP client")?;

    let tokens = Arc::new(TokenManager::new(
        http.clone(),
        config.token_url.clone(),
        secret_provider(&config, http.clone()),
        config.secret.clone(),
    ));
    let client = Arc::new(DpcClient::with_client(
        config.api_url.clone(),
        config.projects.clone(),
        http,
    ));

    let batch_service: Arc<dyn BatchService> =
        Arc::new(StandardBatchService::new(tokens, client));

    let event = event::read_event(cli.event.as_deref()).await?;

    let batch = batch_service.process(&event.records).await;
    let status = batch.status_code();

    let response = batch.into_response();
    let output = if cli.pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .context("Failed to serialize batch response")?;
    println!("{}", output);

    if status == ExecutionResult::SUCCESS {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Builds the configured secret provider
fn secret_provider(config: &Config, http: reqwest::Client) -> Arc<dyn SecretProvider> {
    match &config.secret_source {
        SecretSource::Extension { url } => {
            let session_token = std::env::var("AWS_SESSION_TOKEN").ok();
            Arc::new(ExtensionSecretProvider::new(url.clone(), http, session_token))
        }
        SecretSource::File { path } => Arc::new(FileSecretProvider::new(path.clone())),
    }
}
