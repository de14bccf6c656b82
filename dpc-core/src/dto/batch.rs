//! Batch response returned to the caller

use serde::{Deserialize, Serialize};

use crate::domain::execution::ExecutionResult;

/// `{ statusCode, body: [ {statusCode, message}, ... ] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub status_code: u16,
    pub body: Vec<ExecutionResult>,
}
