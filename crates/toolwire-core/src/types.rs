use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of a logical endpoint on the tool server (e.g. `dex`, `bridge`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelName(pub String);

impl ChannelName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChannelName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ChannelName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for ChannelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Session token announced by the server once per stream connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier tying a posted request to the response frame that answers it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read an id out of a JSON-RPC `id` field. Numbers are accepted and
    /// rendered in decimal; anything else is not an id.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A live session on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub channel: ChannelName,
    pub session_id: SessionId,
    pub established_at: DateTime<Utc>,
}

/// A request that has been posted and is waiting for its response frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub id: RequestId,
    pub channel: ChannelName,
    pub issued_at: DateTime<Utc>,
}

/// Successful outcome of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Newline-joined `text` items of the result content, if any.
    pub text: Option<String>,
    /// The full response frame as received.
    pub payload: Value,
}

impl ToolOutput {
    /// Text for presenting the result: the extracted text content, or the
    /// pretty-printed payload when the response carried no text items.
    #[must_use]
    pub fn display_text(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => serde_json::to_string_pretty(&self.payload).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_from_string_and_number() {
        assert_eq!(
            RequestId::from_json(&serde_json::json!("GET_TOKENS_abc")),
            Some(RequestId::from("GET_TOKENS_abc"))
        );
        assert_eq!(
            RequestId::from_json(&serde_json::json!(42)),
            Some(RequestId::from("42"))
        );
        assert!(RequestId::from_json(&Value::Null).is_none());
        assert!(RequestId::from_json(&serde_json::json!({"id": 1})).is_none());
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&ChannelName::from("dex")).unwrap();
        assert_eq!(json, "\"dex\"");

        let id: SessionId = serde_json::from_str("\"abc-123\"").unwrap();
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn display_text_prefers_extracted_text() {
        let output = ToolOutput {
            text: Some("hello".to_string()),
            payload: serde_json::json!({"id": "x"}),
        };
        assert_eq!(output.display_text(), "hello");
    }

    #[test]
    fn display_text_falls_back_to_payload() {
        let output = ToolOutput {
            text: None,
            payload: serde_json::json!({"id": "x", "result": {"value": 1}}),
        };
        let text = output.display_text();
        assert!(text.contains("\"value\": 1"));
    }
}
