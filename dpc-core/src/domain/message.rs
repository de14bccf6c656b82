//! Queue message domain types

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::dto::execution::PipelineExecution;

/// A pipeline trigger request delivered through the queue
///
/// Parsed once from a record body and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    pub project_name: String,
    pub environment_name: String,
    pub pipeline_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scalar_variables: BTreeMap<String, String>,
}

impl QueueMessage {
    /// Parses a queue record body
    pub fn from_body(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// Builds the execution request body sent to the DPC API
    pub fn execution(&self) -> PipelineExecution {
        PipelineExecution {
            pipeline_name: self.pipeline_name.clone(),
            environment_name: self.environment_name.clone(),
            scalar_variables: self.scalar_variables.clone(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<BTreeMap<String, String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
