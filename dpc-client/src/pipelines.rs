//! Pipeline execution endpoint

use dpc_core::domain::project::ProjectId;
use dpc_core::dto::execution::PipelineExecution;
use reqwest::StatusCode;
use tracing::{info, warn};

use crate::error::{TriggerError, describe_transport};
use crate::{DpcClient, response_text};

impl DpcClient {
    /// URL of the execution endpoint for a project
    pub fn execution_url(&self, project_id: &ProjectId) -> String {
        format!(
            "{}/v1/projects/{}/pipeline-executions",
            self.base_url, project_id
        )
    }

    /// Trigger a pipeline execution
    ///
    /// The project name is resolved before any request is sent, so an
    /// unknown project never reaches the network. A single attempt is made.
    ///
    /// # Arguments
    /// * `access_token` - Bearer token for the DPC API
    /// * `project_name` - Human-readable project name from the registry
    /// * `execution` - Pipeline, environment and scalar variables
    ///
    /// # Returns
    /// The raw response body on HTTP 201
    pub async fn trigger_pipeline(
        &self,
        access_token: &str,
        project_name: &str,
        execution: &PipelineExecution,
    ) -> Result<String, TriggerError> {
        let project_id = self
            .projects
            .resolve(project_name)
            .ok_or_else(|| TriggerError::UnknownProject(project_name.to_string()))?;

        let url = self.execution_url(project_id);

        info!(
            project = project_name,
            environment = %execution.environment_name,
            "Requesting execution of {}",
            execution.pipeline_name
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(execution)
            .send()
            .await
            .map_err(|e| TriggerError::Transport {
                pipeline: execution.pipeline_name.clone(),
                reason: describe_transport(&e),
            })?;

        let status = response.status();

        if status != StatusCode::CREATED {
            let body = response_text(response).await;
            warn!(
                status = status.as_u16(),
                "Failed to trigger pipeline {}", execution.pipeline_name
            );
            return Err(TriggerError::Rejected {
                pipeline: execution.pipeline_name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        info!("Pipeline {} triggered successfully", execution.pipeline_name);

        Ok(accepted_body(&execution.pipeline_name, response.text().await))
    }
}

/// Body of an accepted execution; empty when it could not be read
fn accepted_body<E: std::fmt::Display>(pipeline: &str, body: Result<String, E>) -> String {
    body.unwrap_or_else(|e| {
        warn!("Failed to read response body for pipeline {}: {}", pipeline, e);
        String::new()
    })
}
