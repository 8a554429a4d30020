//! Classification of SSE `data:` payloads.
//!
//! A tool server's stream carries two kinds of payload:
//!
//! - a session announcement, a path such as `/messages?sessionId=<id>`
//!   telling the client where to post requests for this connection;
//! - a JSON-RPC response object tagged with the `id` of the request it answers.
//!
//! Anything else (notifications, keep-alive noise, malformed JSON) is
//! reported as a [`FrameError`] so the reader can log and drop it.

use serde_json::Value;

use toolwire_core::types::{RequestId, SessionId};

/// Query parameter carrying the session id in an announcement.
pub const SESSION_PARAM: &str = "sessionId";

/// A classified data payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    SessionAnnouncement(SessionId),
    Response(ResponseFrame),
}

/// A response tagged with the id of its request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFrame {
    pub id: RequestId,
    pub payload: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("empty data payload")]
    Empty,

    #[error("session path without a {SESSION_PARAM} parameter: {0}")]
    MissingSessionId(String),

    #[error("payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload carries no request id")]
    MissingId,
}

/// Classify one `data:` payload (the text after the `data: ` prefix).
///
/// # Errors
///
/// Returns a [`FrameError`] when the payload is neither a session
/// announcement nor an id-tagged JSON object.
pub fn parse_data(data: &str) -> Result<Frame, FrameError> {
    let data = data.trim();
    if data.is_empty() {
        return Err(FrameError::Empty);
    }

    if data.starts_with('/') {
        return session_from_path(data)
            .map(Frame::SessionAnnouncement)
            .ok_or_else(|| FrameError::MissingSessionId(data.to_string()));
    }

    let payload: Value = serde_json::from_str(data)?;
    let id = payload
        .get("id")
        .and_then(RequestId::from_json)
        .ok_or(FrameError::MissingId)?;

    Ok(Frame::Response(ResponseFrame { id, payload }))
}

fn session_from_path(path: &str) -> Option<SessionId> {
    let (_, query) = path.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SESSION_PARAM)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(SessionId::from)
}
