//! Execution outcome types

use serde::{Deserialize, Serialize};

use crate::dto::batch::BatchResponse;

/// Outcome of processing a single queue record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub status_code: u16,
    pub message: String,
}

impl ExecutionResult {
    pub const SUCCESS: u16 = 200;
    pub const FAILURE: u16 = 500;

    /// Result for a pipeline the DPC API accepted
    pub fn triggered(pipeline_name: &str, response: &str) -> Self {
        Self {
            status_code: Self::SUCCESS,
            message: format!("Triggered {} successfully! {}", pipeline_name, response),
        }
    }

    /// Result for a record that failed at any stage
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            status_code: Self::FAILURE,
            message: format!("Error triggering pipeline: {}", error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == Self::SUCCESS
    }
}

/// Ordered per-record results of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    results: Vec<ExecutionResult>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ExecutionResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[ExecutionResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    /// 500 if any record failed, 200 otherwise (including an empty batch)
    pub fn status_code(&self) -> u16 {
        if self.failure_count() > 0 {
            ExecutionResult::FAILURE
        } else {
            ExecutionResult::SUCCESS
        }
    }

    pub fn into_response(self) -> BatchResponse {
        BatchResponse {
            status_code: self.status_code(),
            body: self.results,
        }
    }
}

impl FromIterator<ExecutionResult> for BatchResult {
    fn from_iter<I: IntoIterator<Item = ExecutionResult>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}
