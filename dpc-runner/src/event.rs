//! Queue event intake
//!
//! Reads the event envelope delivered to one invocation, either from a file
//! or from standard input.

use anyhow::{Context, Result};
use dpc_core::dto::queue::QueueEvent;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Reads and parses an event; `None` or `-` reads standard input
pub async fn read_event(path: Option<&Path>) -> Result<QueueEvent> {
    let raw = match path {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read event file {}", path.display()))?,
        _ => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read event from stdin")?;
            raw
        }
    };

    parse_event(&raw)
}

/// Parses an event envelope
pub fn parse_event(raw: &str) -> Result<QueueEvent> {
    serde_json::from_str(raw).context("Event is not a valid queue event")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event() {
        let event = parse_event(
            r#"{"Records": [{"messageId": "1", "body": "{\"projectName\":\"p\"}"}]}"#,
        )
        .unwrap();
        assert_eq!(event.records.len(), 1);
        assert_eq!(event.records[0].body, r#"{"projectName":"p"}"#);
    }

    #[test]
    fn test_parse_event_rejects_garbage() {
        assert!(parse_event("[1, 2]").is_err());
        assert!(parse_event(r#"{"Records": [{"messageId": "1"}]}"#).is_err());
    }

    #[tokio::test]
    async fn test_read_event_from_file() {
        let path = std::env::temp_dir().join(format!("dpc-event-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"{"Records": [{"body": "{}"}, {"body": "[]"}]}"#)
            .await
            .unwrap();

        let event = read_event(Some(path.as_path())).await.unwrap();
        assert_eq!(event.records.len(), 2);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_event_missing_file() {
        let err = read_event(Some(Path::new("/nonexistent/event.json")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/event.json"));
    }
}
