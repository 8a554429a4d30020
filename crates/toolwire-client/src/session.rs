use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use toolwire_core::error::ToolError;
use toolwire_core::types::{ChannelName, Session, SessionId};

use crate::channel::{Channel, StreamState};
use crate::config::ClientConfig;
use crate::reader::{self, ReaderHandle};

/// Outcome of [`SessionRegistry::shutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Readers that exited within the grace period.
    pub joined: usize,
    /// Readers left running when the grace period ran out.
    pub abandoned: usize,
}

/// Tracks, per channel, the stream reader and the session it announced.
pub struct SessionRegistry {
    config: ClientConfig,
    http: Client,
    /// Map of channel name -> channel state. Only held long enough to look
    /// up or insert; channels never wait on each other.
    channels: RwLock<HashMap<ChannelName, Arc<Channel>>>,
    /// Parent of every reader's cancellation token.
    shutdown: CancellationToken,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(config: ClientConfig, http: Client) -> Self {
        Self {
            config,
            http,
            channels: RwLock::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Get the state for `name`, creating it on first use.
    pub async fn channel(&self, name: &ChannelName) -> Arc<Channel> {
        if let Some(channel) = self.channels.read().await.get(name) {
            return Arc::clone(channel);
        }
        let mut channels = self.channels.write().await;
        let channel = channels.entry(name.clone()).or_insert_with(|| {
            Arc::new(Channel::new(name.clone(), self.config.stale_response_grace))
        });
        Arc::clone(channel)
    }

    /// Make sure `name` has a running reader with a live session.
    ///
    /// Reuses the current stream when its reader is still running; otherwise
    /// starts a new reader. Each caller then waits for the session
    /// announcement until its own establish deadline, counted from when it
    /// called. A reader that has been connecting for longer than the
    /// establish timeout without announcing a session is cancelled and
    /// replaced by the next caller.
    ///
    /// # Errors
    ///
    /// [`ToolError::Connection`] if the stream could not be opened or died
    /// before announcing a session, [`ToolError::Session`] if it stayed open
    /// without announcing one in time.
    pub async fn ensure_stream(&self, name: &ChannelName) -> Result<Session, ToolError> {
        self.ensure(name).await.map(|(_, session)| session)
    }

    pub(crate) async fn ensure(
        &self,
        name: &ChannelName,
    ) -> Result<(Arc<Channel>, Session), ToolError> {
        let waited = self.config.establish_timeout;
        let deadline = Instant::now() + waited;
        let channel = self.channel(name).await;

        if self.shutdown.is_cancelled() {
            return Err(ToolError::Connection {
                channel: name.clone(),
                reason: "client has been shut down".to_string(),
            });
        }

        // Held only while deciding whether to start a reader.
        {
            let mut reader = channel.reader.lock().await;
            let start = match reader.as_ref() {
                Some(handle) if handle.is_alive() => {
                    if let Some(session) = channel.session() {
                        return Ok((Arc::clone(&channel), session));
                    }
                    let silent = channel.state() == StreamState::Connecting
                        && handle.started_at.elapsed() >= waited;
                    if silent {
                        tracing::warn!(
                            "Event stream for channel '{name}' never announced a session, replacing it"
                        );
                        handle.cancel.cancel();
                    }
                    silent
                }
                Some(_) => {
                    tracing::info!("Event stream for channel '{name}' is gone, reconnecting");
                    true
                }
                None => true,
            };
            if start {
                *reader = Some(reader::spawn(
                    self.http.clone(),
                    Arc::clone(&channel),
                    self.config.sse_url(name.as_str()),
                    self.shutdown.child_token(),
                ));
            }
        }

        let mut state = channel.subscribe();
        let settled = tokio::time::timeout_at(
            deadline,
            state.wait_for(|s| !matches!(s, StreamState::Connecting)),
        )
        .await;

        let outcome = match settled {
            Ok(Ok(settled)) => match &*settled {
                StreamState::Live(session) => Ok(session.clone()),
                StreamState::Closed(reason) => Err(reason.clone()),
                StreamState::Idle | StreamState::Connecting => Err("stream not started".to_string()),
            },
            Ok(Err(_)) => Err("stream state dropped".to_string()),
            Err(_) => {
                tracing::error!("Timeout waiting for session id for channel '{name}'");
                return Err(ToolError::Session {
                    channel: name.clone(),
                    waited,
                });
            }
        };

        match outcome {
            Ok(session) => {
                tracing::info!("Event stream ready for channel '{name}'");
                Ok((Arc::clone(&channel), session))
            }
            Err(reason) => Err(ToolError::Connection {
                channel: name.clone(),
                reason,
            }),
        }
    }

    /// The last announced session id of `name`, if its stream is live.
    pub async fn current_session_id(&self, name: &ChannelName) -> Option<SessionId> {
        let channels = self.channels.read().await;
        channels
            .get(name)
            .and_then(|channel| channel.session())
            .map(|session| session.session_id)
    }

    /// Signal every reader to stop and wait for them until `grace` runs out.
    ///
    /// Readers still running at the deadline are left detached, not aborted.
    /// Later calls to [`Self::ensure_stream`] fail.
    pub async fn shutdown(&self, grace: Duration) -> ShutdownReport {
        self.shutdown.cancel();

        let channels: Vec<Arc<Channel>> = self.channels.read().await.values().cloned().collect();
        let deadline = Instant::now() + grace;
        let mut joined = 0;
        let mut abandoned = 0;

        for channel in channels {
            let Some(handle) = channel.reader.lock().await.take() else {
                continue;
            };
            handle.cancel.cancel();
            if tokio::time::timeout_at(deadline, handle.task).await.is_ok() {
                joined += 1;
            } else {
                tracing::warn!(
                    "Reader for channel '{}' did not stop within {grace:?}; abandoning it",
                    channel.name
                );
                abandoned += 1;
            }
        }

        ShutdownReport { joined, abandoned }
    }
}
