use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use toolwire_core::types::{ChannelName, SessionId};
use toolwire_mcp::jsonrpc::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};
use toolwire_mcp::{JsonRpcRequest, JsonRpcResponse};

use crate::app_state::AppState;

/// Query string of the message endpoint.
#[derive(serde::Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Accept a JSON-RPC request for a session.
///
/// Returns 202 right away; the response is sent on the session's stream.
#[allow(clippy::missing_errors_doc)]
pub async fn post_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    Json(req): Json<JsonRpcRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let session_id = SessionId::from(query.session_id);
    let Some(channel) = state.sessions.channel_of(&session_id).await else {
        return Err((
            StatusCode::NOT_FOUND,
            format!("Unknown session: {session_id}"),
        ));
    };

    // Notifications (no id / null id) get no response
    if req.is_notification() {
        tracing::info!("Received notification on '{channel}': {}", req.method);
        return Ok(StatusCode::ACCEPTED);
    }

    tokio::spawn(async move {
        let response = dispatch(&state, &channel, &req).await;
        let response_value = serde_json::to_value(&response).unwrap_or_default();
        if !state.sessions.send(&session_id, response_value).await {
            tracing::warn!(
                "Session {session_id} closed before its '{}' response could be sent",
                req.method
            );
        }
    });

    Ok(StatusCode::ACCEPTED)
}

/// Process one request against the tools of `channel`.
pub async fn dispatch(
    state: &AppState,
    channel: &ChannelName,
    req: &JsonRpcRequest,
) -> JsonRpcResponse {
    match req.method.as_str() {
        "initialize" => handle_initialize(req),
        "tools/list" => handle_tools_list(state, channel, req),
        "tools/call" => handle_tools_call(state, channel, req).await,
        _ => JsonRpcResponse::error(req.id.clone(), METHOD_NOT_FOUND, "Method not found"),
    }
}

fn handle_initialize(req: &JsonRpcRequest) -> JsonRpcResponse {
    JsonRpcResponse::success(
        req.id.clone(),
        serde_json::json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "toolwire",
                "version": env!("CARGO_PKG_VERSION")
            }
        }),
    )
}

fn handle_tools_list(state: &AppState, channel: &ChannelName, req: &JsonRpcRequest) -> JsonRpcResponse {
    let tools = state.tools.definitions(channel);
    JsonRpcResponse::success(req.id.clone(), serde_json::json!({ "tools": tools }))
}

async fn handle_tools_call(
    state: &AppState,
    channel: &ChannelName,
    req: &JsonRpcRequest,
) -> JsonRpcResponse {
    let Some(params) = &req.params else {
        return JsonRpcResponse::error(req.id.clone(), INVALID_PARAMS, "Missing params");
    };

    let tool_name = params
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or(Value::Object(serde_json::Map::new()));

    let Some(tool) = state.tools.get(channel, tool_name) else {
        return JsonRpcResponse::error(
            req.id.clone(),
            INVALID_PARAMS,
            format!("Unknown tool: {tool_name}"),
        );
    };

    match tool.call(arguments).await {
        Ok(value) => {
            let text = match value {
                Value::String(text) => text,
                other => serde_json::to_string_pretty(&other).unwrap_or_default(),
            };
            JsonRpcResponse::success(
                req.id.clone(),
                serde_json::json!({
                    "content": [{
                        "type": "text",
                        "text": text
                    }]
                }),
            )
        }
        Err(err) => {
            tracing::warn!("Tool '{tool_name}' on '{channel}' failed: {err}");
            JsonRpcResponse::error(req.id.clone(), INTERNAL_ERROR, err)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use toolwire_core::types::RequestId;

    use super::*;
    use crate::tools::{EchoTool, ToolHost};

    fn state() -> AppState {
        AppState::new(ToolHost::new().with_tool("dex", EchoTool))
    }

    fn dex() -> ChannelName {
        ChannelName::from("dex")
    }

    #[tokio::test]
    async fn tools_call_wraps_result_as_text() {
        let req = JsonRpcRequest::tools_call(&RequestId::from("echo_1"), "echo", json!({"chainId": "1"}));
        let resp = dispatch(&state(), &dex(), &req).await;

        assert_eq!(resp.id, json!("echo_1"));
        let text = resp.result.unwrap()["content"][0]["text"].as_str().unwrap().to_string();
        let echoed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(echoed, json!({"chainId": "1"}));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let req = JsonRpcRequest::tools_call(&RequestId::from("x"), "GET_TOKENS", json!({}));
        let resp = dispatch(&state(), &dex(), &req).await;
        assert_eq!(resp.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn missing_params() {
        let req = JsonRpcRequest::new(&RequestId::from("x"), "tools/call", None);
        let resp = dispatch(&state(), &dex(), &req).await;
        assert_eq!(resp.error.unwrap().message, "Missing params");
    }

    #[tokio::test]
    async fn lists_channel_tools() {
        let req = JsonRpcRequest::new(&RequestId::from("l"), "tools/list", None);
        let resp = dispatch(&state(), &dex(), &req).await;
        assert_eq!(resp.result.unwrap()["tools"][0]["name"], "echo");
    }

    #[tokio::test]
    async fn unknown_method() {
        let req = JsonRpcRequest::new(&RequestId::from("m"), "resources/list", None);
        let resp = dispatch(&state(), &dex(), &req).await;
        assert_eq!(resp.error.unwrap().code, METHOD_NOT_FOUND);
    }
}
