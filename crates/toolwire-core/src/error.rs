use std::time::Duration;

use serde_json::Value;

use crate::types::{ChannelName, RequestId};

/// Failure of a tool call, as returned to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("event stream for channel '{channel}' unavailable: {reason}")]
    Connection { channel: ChannelName, reason: String },

    #[error("no session announced on channel '{channel}' within {waited:?}")]
    Session {
        channel: ChannelName,
        waited: Duration,
    },

    #[error("no response to request '{id}' within {waited:?}")]
    Timeout { id: RequestId, waited: Duration },

    #[error("failed to post request '{id}': {reason}")]
    Transport {
        id: RequestId,
        status: Option<u16>,
        reason: String,
    },

    #[error("tool error for request '{id}': {message}")]
    Remote {
        id: RequestId,
        code: Option<i64>,
        message: String,
        data: Option<Value>,
    },
}

impl ToolError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Connection { .. } => FailureKind::Connection,
            Self::Session { .. } => FailureKind::Session,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Transport { .. } => FailureKind::Transport,
            Self::Remote { .. } => FailureKind::Remote,
        }
    }
}

/// Coarse classification of a [`ToolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Connection,
    Session,
    Timeout,
    Transport,
    Remote,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection_error",
            Self::Session => "session_error",
            Self::Timeout => "timeout_error",
            Self::Transport => "transport_error",
            Self::Remote => "remote_error",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_have_stable_names() {
        let err = ToolError::Timeout {
            id: RequestId::from("GET_TOKENS_1"),
            waited: Duration::from_secs(30),
        };
        assert_eq!(err.kind(), FailureKind::Timeout);
        assert_eq!(err.kind().to_string(), "timeout_error");

        let err = ToolError::Session {
            channel: ChannelName::from("dex"),
            waited: Duration::from_secs(10),
        };
        assert_eq!(err.kind().as_str(), "session_error");
    }

    #[test]
    fn remote_error_message() {
        let err = ToolError::Remote {
            id: RequestId::from("7"),
            code: Some(-32603),
            message: "chain not supported".to_string(),
            data: None,
        };
        assert_eq!(
            err.to_string(),
            "tool error for request '7': chain not supported"
        );
        assert_eq!(err.kind(), FailureKind::Remote);
    }
}
