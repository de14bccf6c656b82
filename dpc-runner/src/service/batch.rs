//! Batch processing service
//!
//! Processes queue records strictly in arrival order. Each record is parsed,
//! authorized and triggered on its own; a failure becomes a 500 entry in the
//! batch result and never stops the records after it.

use async_trait::async_trait;
use dpc_client::{AuthError, DpcClient, TokenManager, TriggerError};
use dpc_core::domain::execution::{BatchResult, ExecutionResult};
use dpc_core::domain::message::QueueMessage;
use dpc_core::dto::queue::QueueRecord;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Why a single record could not be triggered
#[derive(Debug, Error)]
pub enum RecordError {
    /// Body is not JSON or lacks a required field
    #[error("Invalid queue message: {0}")]
    MessageParse(#[from] serde_json::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

/// Service trait for processing a batch of queue records
#[async_trait]
pub trait BatchService: Send + Sync {
    /// Processes every record and returns one result per record, in order
    async fn process(&self, records: &[QueueRecord]) -> BatchResult;
}

/// Standard implementation of BatchService
pub struct StandardBatchService {
    tokens: Arc<TokenManager>,
    client: Arc<DpcClient>,
}

impl StandardBatchService {
    /// Creates a new batch service
    ///
    /// The token manager is shared across batches so a token obtained for one
    /// batch is reused by the next while it is valid.
    pub fn new(tokens: Arc<TokenManager>, client: Arc<DpcClient>) -> Self {
        Self { tokens, client }
    }

    /// Triggers the pipeline described by one record
    ///
    /// # Returns
    /// The pipeline name and the raw API response body
    async fn process_record(
        &self,
        record: &QueueRecord,
    ) -> Result<(String, String), RecordError> {
        let message = QueueMessage::from_body(&record.body)?;

        let access_token = self.tokens.get_access_token().await?;

        let response = self
            .client
            .trigger_pipeline(&access_token, &message.project_name, &message.execution())
            .await?;

        Ok((message.pipeline_name, response))
    }
}

#[async_trait]
impl BatchService for StandardBatchService {
    async fn process(&self, records: &[QueueRecord]) -> BatchResult {
        info!("Processing batch of {} record(s)", records.len());

        let mut batch = BatchResult::new();

        for (index, record) in records.iter().enumerate() {
            let message_id = record.message_id.as_deref().unwrap_or("-");

            match self.process_record(record).await {
                Ok((pipeline_name, response)) => {
                    info!(index, message_id, "Triggered {}", pipeline_name);
                    batch.push(ExecutionResult::triggered(&pipeline_name, &response));
                }
                Err(e) => {
                    error!(index, message_id, "Error triggering pipeline: {}", e);
                    batch.push(ExecutionResult::failed(&e));
                }
            }
        }

        info!(
            status = batch.status_code(),
            "Batch complete: {} succeeded, {} failed",
            batch.len() - batch.failure_count(),
            batch.failure_count()
        );

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpc_client::{InMemorySecretProvider, SecretLocation};
    use dpc_core::domain::project::ProjectRegistry;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PROJECT_ID: &str = "c28506c2-66eb-4acb-9427-9665a461da71";
    const SECRET: &str = r#"{"MATILLION_CLIENT_ID":"client-1","MATILLION_CLIENT_SECRET":"s3cret"}"#;
    const TOKEN_PATH: &str = "/oauth/dpc/token";

    fn execution_path() -> String {
        format!("/v1/projects/{}/pipeline-executions", PROJECT_ID)
    }

    fn service(server: &MockServer, secret: &str) -> StandardBatchService {
        let http = reqwest::Client::new();
        let secrets = Arc::new(InMemorySecretProvider::new().with_secret("dpc-api", secret));
        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            format!("{}{}", server.uri(), TOKEN_PATH),
            secrets,
            SecretLocation::new("dpc-api", "eu-west-1"),
        ));
        let projects = ProjectRegistry::new().with_project("My first project", PROJECT_ID);
        let client = Arc::new(DpcClient::with_client(server.uri(), projects, http));
        StandardBatchService::new(tokens, client)
    }

    async fn mount_token(server: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "token-1",
                "expires_in": 3600
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    fn record(project: &str, pipeline: &str) -> QueueRecord {
        QueueRecord::new(
            serde_json::json!({
                "projectName": project,
                "environmentName": "prod",
                "pipelineName": pipeline,
                "scalarVariables": {"run": "1"}
            })
            .to_string(),
        )
    }

    #[tokio::test]
    async fn test_known_and_unknown_project() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path(execution_path()))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id":"exec-1"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let batch = service(&server, SECRET)
            .process(&[
                record("My first project", "daily-load"),
                record("Unknown", "weekly-load"),
            ])
            .await;

        assert_eq!(
            batch.results(),
            &[
                ExecutionResult {
                    status_code: 200,
                    message: r#"Triggered daily-load successfully! {"id":"exec-1"}"#.to_string(),
                },
                ExecutionResult {
                    status_code: 500,
                    message: "Error triggering pipeline: Project ID not found for project: Unknown"
                        .to_string(),
                },
            ]
        );
        assert_eq!(batch.status_code(), 500);
    }

    #[tokio::test]
    async fn test_all_records_succeed_with_one_token() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path(execution_path()))
            .respond_with(ResponseTemplate::new(201).set_body_string("{}"))
            .expect(3)
            .mount(&server)
            .await;

        let service = service(&server, SECRET);
        let records = vec![
            record("My first project", "a"),
            record("My first project", "b"),
            record("My first project", "c"),
        ];

        let batch = service.process(&records).await;
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.status_code(), 200);
        let messages: Vec<&str> = batch.results().iter().map(|r| r.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Triggered a successfully! {}",
                "Triggered b successfully! {}",
                "Triggered c successfully! {}",
            ]
        );
    }

    #[tokio::test]
    async fn test_token_is_shared_across_batches() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path(execution_path()))
            .respond_with(ResponseTemplate::new(201))
            .expect(2)
            .mount(&server)
            .await;

        let service = service(&server, SECRET);
        let first = service.process(&[record("My first project", "a")]).await;
        let second = service.process(&[record("My first project", "b")]).await;

        assert_eq!(first.status_code(), 200);
        assert_eq!(second.status_code(), 200);
    }

    #[tokio::test]
    async fn test_malformed_secret_fails_every_record() {
        let server = MockServer::start().await;
        mount_token(&server, 0).await;
        Mock::given(method("POST"))
            .and(path(execution_path()))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let batch = service(&server, r#"{"MATILLION_CLIENT_ID":"client-1"}"#)
            .process(&[
                record("My first project", "a"),
                record("My first project", "b"),
            ])
            .await;

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.status_code(), 500);
        for result in batch.results() {
            assert_eq!(result.status_code, 500);
            assert!(result.message.starts_with("Error triggering pipeline: "));
            assert!(result.message.contains("MATILLION_CLIENT_SECRET"));
        }
    }

    #[tokio::test]
    async fn test_rejected_execution_reports_body() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path(execution_path()))
            .respond_with(ResponseTemplate::new(400).set_body_string("environment not found"))
            .mount(&server)
            .await;

        let batch = service(&server, SECRET)
            .process(&[record("My first project", "daily-load")])
            .await;

        assert_eq!(
            batch.results()[0],
            ExecutionResult {
                status_code: 500,
                message: "Error triggering pipeline: Failed to trigger pipeline daily-load. Response: environment not found"
                    .to_string(),
            }
        );
        assert_eq!(batch.status_code(), 500);
    }

    #[tokio::test]
    async fn test_malformed_body_does_not_abort_batch() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path(execution_path()))
            .respond_with(ResponseTemplate::new(201).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let batch = service(&server, SECRET)
            .process(&[
                QueueRecord::new("{not json"),
                QueueRecord::new(r#"{"projectName": "My first project"}"#),
                record("My first project", "a"),
            ])
            .await;

        let codes: Vec<u16> = batch.results().iter().map(|r| r.status_code).collect();
        assert_eq!(codes, vec![500, 500, 200]);
        assert!(
            batch.results()[0]
                .message
                .starts_with("Error triggering pipeline: Invalid queue message: ")
        );
        assert_eq!(batch.status_code(), 500);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let server = MockServer::start().await;
        mount_token(&server, 0).await;

        let batch = service(&server, SECRET).process(&[]).await;
        assert!(batch.is_empty());
        assert_eq!(batch.status_code(), 200);
    }
}
