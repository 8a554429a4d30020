use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use toolwire_core::error::ToolError;
use toolwire_core::ids::ContentHashIds;
use toolwire_core::traits::RequestIdStrategy;
use toolwire_core::types::{ChannelName, RequestId, Session, SessionId, ToolOutput};
use toolwire_mcp::frame::SESSION_PARAM;
use toolwire_mcp::{content, JsonRpcRequest, ToolDefinition};

use crate::channel::Channel;
use crate::config::ClientConfig;
use crate::session::{SessionRegistry, ShutdownReport};

/// Reachability of the tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthStatus {
    Connected,
    Error { message: String },
}

/// Calls tools on a remote tool server.
///
/// Each channel gets one SSE stream, opened on first use and reopened by the
/// next call after it dies. Requests are posted over plain HTTP and their
/// responses picked out of the stream by id. Safe to share between tasks.
pub struct ToolClient {
    config: ClientConfig,
    http: Client,
    sessions: SessionRegistry,
    ids: Arc<dyn RequestIdStrategy>,
}

impl ToolClient {
    /// Create a client using content-hash request ids.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let http = Client::new();
        Self {
            sessions: SessionRegistry::new(config.clone(), http.clone()),
            config,
            http,
            ids: Arc::new(ContentHashIds),
        }
    }

    /// Replace the request id strategy.
    #[must_use]
    pub fn with_id_strategy(mut self, ids: Arc<dyn RequestIdStrategy>) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Call `tool` on `channel` and wait for its result.
    ///
    /// # Errors
    ///
    /// Every failure is reported as a [`ToolError`]; see its variants for
    /// the stage each one comes from.
    pub async fn call(
        &self,
        channel: &str,
        tool: &str,
        arguments: Value,
    ) -> Result<ToolOutput, ToolError> {
        let id = self.ids.request_id(tool, &arguments);
        let request = JsonRpcRequest::tools_call(&id, tool, arguments);
        let payload = self.request(&ChannelName::from(channel), &id, &request).await?;
        tracing::info!("Got response for {tool}");
        content::interpret(&id, payload)
    }

    /// List the tools offered on `channel`.
    ///
    /// # Errors
    ///
    /// As for [`Self::call`]; a malformed listing is reported as
    /// [`ToolError::Remote`].
    pub async fn list_tools(&self, channel: &str) -> Result<Vec<ToolDefinition>, ToolError> {
        let id = self.ids.request_id("tools/list", &Value::Null);
        let request = JsonRpcRequest::new(&id, "tools/list", None);
        let payload = self.request(&ChannelName::from(channel), &id, &request).await?;
        let result = content::into_result(&id, payload)?;
        ToolDefinition::list_from_result(&result).map_err(|e| ToolError::Remote {
            id,
            code: None,
            message: format!("malformed tool listing: {e}"),
            data: Some(result),
        })
    }

    /// The current session id of `channel`, if its stream is live.
    pub async fn session_id(&self, channel: &str) -> Option<SessionId> {
        self.sessions
            .current_session_id(&ChannelName::from(channel))
            .await
    }

    /// Check that the server answers 200 on its base URL.
    pub async fn check_health(&self) -> HealthStatus {
        let result = self
            .http
            .get(self.config.health_url())
            .timeout(self.config.health_timeout)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status() == StatusCode::OK => HealthStatus::Connected,
            Ok(resp) => HealthStatus::Error {
                message: format!("Server returned status {}", resp.status()),
            },
            Err(e) => HealthStatus::Error {
                message: format!("Connection failed: {e}"),
            },
        }
    }

    /// Stop every stream reader, waiting up to the configured grace period.
    /// The client cannot be used afterwards.
    pub async fn shutdown(&self) -> ShutdownReport {
        self.sessions.shutdown(self.config.shutdown_grace).await
    }

    /// Ensure the stream, post `request`, and wait for the frame tagged `id`.
    async fn request(
        &self,
        channel: &ChannelName,
        id: &RequestId,
        request: &JsonRpcRequest,
    ) -> Result<Value, ToolError> {
        let (state, session) = self.sessions.ensure(channel).await?;

        state.router.register(id);
        if let Err(err) = self.post(&session, id, request).await {
            state.router.forget(id);
            return Err(err);
        }

        self.await_response(&state, id).await
    }

    async fn post(
        &self,
        session: &Session,
        id: &RequestId,
        request: &JsonRpcRequest,
    ) -> Result<(), ToolError> {
        let transport = |status: Option<u16>, reason: String| ToolError::Transport {
            id: id.clone(),
            status,
            reason,
        };

        let resp = self
            .http
            .post(self.config.messages_url())
            .query(&[(SESSION_PARAM, session.session_id.as_str())])
            .timeout(self.config.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| transport(None, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(
                "Posting {id} on channel '{}' failed with {status}: {body}",
                session.channel
            );
            return Err(transport(Some(status.as_u16()), format!("server returned {status}: {body}")));
        }
        Ok(())
    }

    async fn await_response(&self, channel: &Channel, id: &RequestId) -> Result<Value, ToolError> {
        let waited = self.config.response_timeout;
        channel.router.await_match(id, waited).await.ok_or_else(|| {
            tracing::warn!("Timeout waiting for response to {id} on channel '{}'", channel.name);
            ToolError::Timeout {
                id: id.clone(),
                waited,
            }
        })
    }
}
