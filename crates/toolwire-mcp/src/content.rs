//! Interpretation of matched response payloads.

use serde_json::Value;

use toolwire_core::error::ToolError;
use toolwire_core::types::{RequestId, ToolOutput};

/// Map a `tools/call` response payload to the caller-facing outcome.
///
/// # Errors
///
/// Returns [`ToolError::Remote`] when the payload carries a JSON-RPC error
/// or a tool result flagged with `isError`.
pub fn interpret(id: &RequestId, payload: Value) -> Result<ToolOutput, ToolError> {
    if let Some(err) = remote_error(id, &payload) {
        return Err(err);
    }

    let text = extract_text(&payload);

    let flagged = payload
        .get("result")
        .and_then(|r| r.get("isError"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if flagged {
        return Err(ToolError::Remote {
            id: id.clone(),
            code: None,
            message: text.unwrap_or_else(|| "tool reported an error".to_string()),
            data: payload.get("result").cloned(),
        });
    }

    Ok(ToolOutput { text, payload })
}

/// Return the `result` member of a response payload.
///
/// # Errors
///
/// Returns [`ToolError::Remote`] when the payload carries a JSON-RPC error.
pub fn into_result(id: &RequestId, mut payload: Value) -> Result<Value, ToolError> {
    if let Some(err) = remote_error(id, &payload) {
        return Err(err);
    }
    Ok(payload
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

/// Newline-joined `text` items of `result.content`, or of a top-level
/// `content` array.
pub fn extract_text(payload: &Value) -> Option<String> {
    let content = payload
        .get("result")
        .and_then(|r| r.get("content"))
        .or_else(|| payload.get("content"))?
        .as_array()?;

    let texts: Vec<&str> = content
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
        .map(|item| item.get("text").and_then(Value::as_str).unwrap_or_default())
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}

fn remote_error(id: &RequestId, payload: &Value) -> Option<ToolError> {
    let error = payload.get("error")?;
    if error.is_null() {
        return None;
    }

    let (code, message, data) = match error {
        Value::String(message) => (None, message.clone(), None),
        Value::Object(obj) => (
            obj.get("code").and_then(Value::as_i64),
            obj.get("message")
                .and_then(Value::as_str)
                .map_or_else(|| error.to_string(), ToString::to_string),
            obj.get("data").cloned(),
        ),
        other => (None, other.to_string(), None),
    };

    Some(ToolError::Remote {
        id: id.clone(),
        code,
        message,
        data,
    })
}
