//! Queue event envelope

use serde::{Deserialize, Serialize};

/// A batch of queue records delivered to one invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

/// A single queue record; `body` holds the serialized message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueRecord {
    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub body: String,
}

impl QueueRecord {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            message_id: None,
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_envelope() {
        let event: QueueEvent = serde_json::from_str(
            r#"{"Records": [
                {"messageId": "m-1", "body": "{}", "receiptHandle": "r"},
                {"body": "x"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(event.records.len(), 2);
        assert_eq!(event.records[0].message_id.as_deref(), Some("m-1"));
        assert_eq!(event.records[1].message_id, None);
        assert_eq!(event.records[1].body, "x");
    }

    #[test]
    fn test_missing_records_is_empty_batch() {
        let event: QueueEvent = serde_json::from_str("{}").unwrap();
        assert!(event.records.is_empty());
    }
}
