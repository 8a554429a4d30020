use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use toolwire_core::types::{ChannelName, SessionId};
use toolwire_mcp::frame::SESSION_PARAM;

use crate::app_state::AppState;
use crate::router::MESSAGES_PATH;
use crate::session::SessionManager;

/// Closes a session when its event stream is dropped.
struct SessionGuard {
    sessions: Arc<SessionManager>,
    id: SessionId,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let sessions = Arc::clone(&self.sessions);
        let id = self.id.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                sessions.remove(&id).await;
                tracing::info!("Client disconnected (session {id})");
            });
        }
    }
}

/// Event stream for one channel.
///
/// 1. Server sends `event: endpoint` with the POST URL for this session
/// 2. Client POSTs JSON-RPC to that URL
/// 3. Server sends responses back via `event: message`
#[allow(clippy::missing_errors_doc)]
pub async fn channel_sse(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)>
{
    let channel = ChannelName::from(channel);
    if !state.tools.has_channel(&channel) {
        return Err((StatusCode::NOT_FOUND, format!("Unknown channel: {channel}")));
    }

    let (session_id, rx) = state.sessions.open(&channel).await;
    tracing::info!("Client connected to channel '{channel}' (session {session_id})");

    let endpoint = tokio_stream::once(Ok(Event::default()
        .event("endpoint")
        .data(format!("{MESSAGES_PATH}?{SESSION_PARAM}={session_id}"))));

    let guard = SessionGuard {
        sessions: Arc::clone(&state.sessions),
        id: session_id,
    };
    let responses = BroadcastStream::new(rx).filter_map(move |result| {
        let _ = &guard;
        result.ok().map(|message| {
            Ok(Event::default()
                .event("message")
                .json_data(&*message)
                .unwrap_or_else(|_| Event::default().data("error serializing response")))
        })
    });

    Ok(Sse::new(endpoint.chain(responses)).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::tools::{EchoTool, ToolHost};

    #[tokio::test]
    async fn dropping_the_stream_closes_the_session() {
        let state = AppState::new(ToolHost::new().with_tool("dex", EchoTool));

        let Ok(stream) = channel_sse(State(state.clone()), Path("dex".to_string())).await else {
            panic!("dex should have a stream");
        };
        assert_eq!(state.sessions.len().await, 1);

        drop(stream);
        for _ in 0..50 {
            if state.sessions.is_empty().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session outlived its stream");
    }

    #[tokio::test]
    async fn unknown_channel_opens_no_session() {
        let state = AppState::new(ToolHost::new().with_tool("dex", EchoTool));

        let Err((status, _)) = channel_sse(State(state.clone()), Path("lending".to_string())).await
        else {
            panic!("lending has no tools");
        };
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(state.sessions.is_empty().await);
    }
}
