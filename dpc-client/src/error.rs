//! Error types for the DPC client

use thiserror::Error;

/// Errors raised while retrieving a secret from a [`SecretProvider`](crate::SecretProvider)
#[derive(Debug, Error)]
pub enum SecretError {
    /// The secret identifier does not exist
    #[error("Secret {0} was not found")]
    NotFound(String),

    /// Any other retrieval failure
    #[error("Failed to retrieve secret {secret_id}: {reason}")]
    Access {
        secret_id: String,
        reason: String,
    },
}

impl SecretError {
    pub fn access(secret_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Access {
            secret_id: secret_id.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors raised while obtaining a bearer token
#[derive(Debug, Error)]
pub enum AuthError {
    /// Secret retrieval failed
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// Secret payload is not JSON or lacks a credential field
    #[error("Secret {secret_id} is malformed: {reason}")]
    MalformedSecret {
        secret_id: String,
        reason: String,
    },

    /// Token endpoint rejected the exchange or could not be reached
    #[error("Failed to get access token: {0}")]
    TokenExchange(String),
}

/// Errors raised while triggering a pipeline execution
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Project name has no registered identifier
    #[error("Project ID not found for project: {0}")]
    UnknownProject(String),

    /// DPC API answered with something other than 201
    #[error("Failed to trigger pipeline {pipeline}. Response: {body}")]
    Rejected {
        pipeline: String,
        status: u16,
        body: String,
    },

    /// Request never produced a response (timeout, connection failure)
    #[error("Failed to trigger pipeline {pipeline}: {reason}")]
    Transport { pipeline: String, reason: String },
}

impl TriggerError {
    /// Check if this error was raised before any network call
    pub fn is_unknown_project(&self) -> bool {
        matches!(self, Self::UnknownProject(_))
    }

    /// Status code returned by the API, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Short description of a transport-level failure
pub(crate) fn describe_transport(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_error_messages() {
        let err = TriggerError::UnknownProject("Sales".to_string());
        assert_eq!(err.to_string(), "Project ID not found for project: Sales");
        assert!(err.is_unknown_project());
        assert_eq!(err.status(), None);

        let err = TriggerError::Rejected {
            pipeline: "load".to_string(),
            status: 400,
            body: r#"{"error":"bad env"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"Failed to trigger pipeline load. Response: {"error":"bad env"}"#
        );
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_auth_error_messages() {
        let err = AuthError::from(SecretError::NotFound("api".to_string()));
        assert_eq!(err.to_string(), "Secret api was not found");

        let err = AuthError::TokenExchange("invalid_client".to_string());
        assert_eq!(err.to_string(), "Failed to get access token: invalid_client");
    }
}
