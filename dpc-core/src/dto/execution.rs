//! Pipeline execution request body

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /v1/projects/{projectId}/pipeline-executions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineExecution {
    pub pipeline_name: String,
    pub environment_name: String,
    pub scalar_variables: BTreeMap<String, String>,
}
