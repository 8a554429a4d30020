use std::sync::Arc;

use crate::session::SessionManager;
use crate::tools::ToolHost;

/// Shared application state with injected dependencies.
#[derive(Clone)]
pub struct AppState {
    pub tools: Arc<ToolHost>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    #[must_use]
    pub fn new(tools: ToolHost) -> Self {
        Self {
            tools: Arc::new(tools),
            sessions: Arc::new(SessionManager::new()),
        }
    }
}
