//! Background task owning one channel's SSE connection.
//!
//! The reader never reconnects on its own. When the stream fails or ends it
//! marks the channel closed and exits; the next call on the channel starts a
//! fresh reader.

use std::sync::Arc;

use reqwest::header::{ACCEPT, CACHE_CONTROL, CONNECTION};
use reqwest::Client;
use reqwest_eventsource::{CannotCloneRequestError, Event, EventSource};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use toolwire_mcp::frame::{self, Frame, FrameError};

use crate::channel::Channel;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ReaderError {
    #[error("cannot build stream request: {0}")]
    Request(#[from] CannotCloneRequestError),

    #[error("{0}")]
    Stream(#[from] reqwest_eventsource::Error),

    #[error("stream closed by server")]
    Ended,

    #[error("reader cancelled")]
    Cancelled,
}

/// Handle to a running reader task.
pub(crate) struct ReaderHandle {
    pub task: JoinHandle<()>,
    pub cancel: CancellationToken,
    pub started_at: Instant,
}

impl ReaderHandle {
    pub fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Start a reader for `channel` streaming from `url`.
pub(crate) fn spawn(
    http: Client,
    channel: Arc<Channel>,
    url: String,
    cancel: CancellationToken,
) -> ReaderHandle {
    let generation = channel.begin_generation();
    let task = tokio::spawn(run(http, channel, url, generation, cancel.clone()));
    ReaderHandle {
        task,
        cancel,
        started_at: Instant::now(),
    }
}

async fn run(
    http: Client,
    channel: Arc<Channel>,
    url: String,
    generation: u64,
    cancel: CancellationToken,
) {
    tracing::info!("Starting event stream for channel '{}': {url}", channel.name);

    let reason = read_stream(&http, &channel, &url, generation, &cancel).await;
    if let ReaderError::Cancelled = reason {
        tracing::info!("Event stream for channel '{}' stopped", channel.name);
    } else {
        tracing::error!("Event stream error for channel '{}': {reason}", channel.name);
    }

    channel.close(generation, reason.to_string());
}

/// Consume the stream until it fails, ends, or is cancelled; returns why
/// it stopped.
async fn read_stream(
    http: &Client,
    channel: &Channel,
    url: &str,
    generation: u64,
    cancel: &CancellationToken,
) -> ReaderError {
    let request = http
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .header(CONNECTION, "keep-alive");
    let mut source = match EventSource::new(request) {
        Ok(source) => source,
        Err(err) => return err.into(),
    };

    let reason = loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break ReaderError::Cancelled,
            event = source.next() => event,
        };

        match event {
            Some(Ok(Event::Open)) => {
                tracing::info!("Event stream connected for channel '{}'", channel.name);
            }
            Some(Ok(Event::Message(message))) => {
                tracing::trace!("SSE [{}]: {}", channel.name, message.data);
                dispatch(channel, generation, &message.data);
            }
            Some(Err(reqwest_eventsource::Error::StreamEnded)) | None => {
                break ReaderError::Ended;
            }
            Some(Err(err)) => break err.into(),
        }
    };

    // Stops the event source from reconnecting on its own.
    source.close();
    reason
}

/// Route one data payload: session announcements update the channel,
/// tagged responses go to the router, everything else is dropped.
pub(crate) fn dispatch(channel: &Channel, generation: u64, data: &str) {
    match frame::parse_data(data) {
        Ok(Frame::SessionAnnouncement(session_id)) => {
            if channel.announce(generation, session_id.clone()) {
                tracing::info!("Got session id for channel '{}': {session_id}", channel.name);
            } else {
                tracing::warn!(
                    "Ignoring repeated session announcement on channel '{}': {session_id}",
                    channel.name
                );
            }
        }
        Ok(Frame::Response(response)) => {
            tracing::debug!("Queued response for {} on channel '{}'", response.id, channel.name);
            channel.router.push(response.id, response.payload);
        }
        Err(FrameError::Empty) => {}
        Err(err) => {
            tracing::debug!(
                channel = %channel.name,
                error = %err,
                data,
                "dropping unroutable SSE payload"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use toolwire_core::types::{ChannelName, RequestId, SessionId};

    use super::*;
    use crate::channel::StreamState;

    fn connecting_channel() -> (Channel, u64) {
        let channel = Channel::new(ChannelName::from("dex"), Duration::from_secs(60));
        let generation = channel.begin_generation();
        (channel, generation)
    }

    #[tokio::test]
    async fn announcement_then_response() {
        let (channel, generation) = connecting_channel();

        dispatch(&channel, generation, "/messages?sessionId=s-1");
        dispatch(
            &channel,
            generation,
            r#"{"jsonrpc":"2.0","id":"GET_TOKENS_1","result":{"content":[]}}"#,
        );

        assert_eq!(channel.session().unwrap().session_id, SessionId::from("s-1"));
        let payload = channel
            .router
            .await_match(&RequestId::from("GET_TOKENS_1"), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(payload["result"], json!({"content": []}));
    }

    #[test]
    fn malformed_payloads_are_dropped() {
        let (channel, generation) = connecting_channel();

        dispatch(&channel, generation, "not json at all");
        dispatch(&channel, generation, r#"{"jsonrpc":"2.0","method":"notifications/progress"}"#);
        dispatch(&channel, generation, "/messages?nope=1");
        dispatch(&channel, generation, "");

        assert!(channel.router.is_empty());
        assert_eq!(channel.state(), StreamState::Connecting);
    }
}
