use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use toolwire_core::types::{ChannelName, SessionId};

struct SessionEntry {
    channel: ChannelName,
    sender: broadcast::Sender<Arc<Value>>,
}

/// Manages the SSE sessions of connected clients.
pub struct SessionManager {
    /// Map of session id -> channel and sender feeding that session's stream.
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    /// Streams opened per channel since startup.
    connections: RwLock<HashMap<ChannelName, u64>>,
}

impl SessionManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Open a session on `channel` and return its id and the receiver that
    /// feeds its stream.
    pub async fn open(&self, channel: &ChannelName) -> (SessionId, broadcast::Receiver<Arc<Value>>) {
        let id = SessionId(uuid::Uuid::new_v4().to_string());
        let (sender, receiver) = broadcast::channel(100);
        self.sessions.write().await.insert(
            id.clone(),
            SessionEntry {
                channel: channel.clone(),
                sender,
            },
        );
        *self
            .connections
            .write()
            .await
            .entry(channel.clone())
            .or_default() += 1;
        (id, receiver)
    }

    /// The channel a session belongs to, if it is still open.
    pub async fn channel_of(&self, id: &SessionId) -> Option<ChannelName> {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(|entry| entry.channel.clone())
    }

    /// Push a JSON-RPC message onto a session's stream.
    /// Returns false if the session is gone; a session whose client has
    /// disconnected is removed.
    pub async fn send(&self, id: &SessionId, message: Value) -> bool {
        let delivered = {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(entry) => entry.sender.send(Arc::new(message)).is_ok(),
                None => return false,
            }
        };
        if !delivered {
            self.remove(id).await;
        }
        delivered
    }

    /// Close a session; its stream ends.
    pub async fn remove(&self, id: &SessionId) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
    }

    /// Close every session on `channel`. Returns how many were closed.
    pub async fn disconnect_channel(&self, channel: &ChannelName) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| &entry.channel != channel);
        before - sessions.len()
    }

    /// Number of streams opened on `channel` since startup.
    pub async fn connection_count(&self, channel: &ChannelName) -> u64 {
        let connections = self.connections.read().await;
        connections.get(channel).copied().unwrap_or(0)
    }

    /// Number of open sessions across all channels.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Check if a session is open.
    pub async fn is_connected(&self, id: &SessionId) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(id)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
