use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3002";

/// Endpoints and timing budgets for a [`crate::ToolClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, without a trailing slash.
    pub base_url: String,
    /// Prefix of the per-channel stream endpoint (`<base><sse_path>/<channel>`).
    pub sse_path: String,
    /// Path requests are posted to (`<base><messages_path>?sessionId=<id>`).
    pub messages_path: String,
    /// How long to wait for a new stream to announce its session.
    pub establish_timeout: Duration,
    /// Budget for the POST carrying a request.
    pub request_timeout: Duration,
    /// How long to wait for the matching response after a successful POST.
    pub response_timeout: Duration,
    /// Age after which an unclaimed response is discarded.
    pub stale_response_grace: Duration,
    /// Overall deadline for readers to exit on shutdown.
    pub shutdown_grace: Duration,
    pub health_timeout: Duration,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            sse_path: "/sse".to_string(),
            messages_path: "/messages".to_string(),
            establish_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            response_timeout: Duration::from_secs(30),
            stale_response_grace: Duration::from_secs(120),
            shutdown_grace: Duration::from_secs(1),
            health_timeout: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn with_establish_timeout(mut self, timeout: Duration) -> Self {
        self.establish_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_stale_response_grace(mut self, grace: Duration) -> Self {
        self.stale_response_grace = grace;
        self
    }

    #[must_use]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Stream endpoint for `channel`.
    #[must_use]
    pub fn sse_url(&self, channel: &str) -> String {
        format!("{}{}/{channel}", self.base_url, self.sse_path)
    }

    /// Endpoint requests are posted to; the session id goes in the query.
    #[must_use]
    pub fn messages_url(&self) -> String {
        format!("{}{}", self.base_url, self.messages_path)
    }

    #[must_use]
    pub fn health_url(&self) -> String {
        format!("{}/", self.base_url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
