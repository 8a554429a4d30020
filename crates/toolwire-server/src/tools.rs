use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use toolwire_core::types::ChannelName;
use toolwire_mcp::ToolDefinition;

/// A tool callable through `tools/call`.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name, description and input schema, as listed by `tools/list`.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool. An `Err` is sent back as a JSON-RPC error.
    async fn call(&self, arguments: Value) -> Result<Value, String>;
}

/// Tools grouped by the channel they are served on.
#[derive(Default)]
pub struct ToolHost {
    channels: HashMap<ChannelName, BTreeMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tool` on `channel`, replacing a tool of the same name.
    #[must_use]
    pub fn with_tool(
        mut self,
        channel: impl Into<ChannelName>,
        tool: impl ToolHandler + 'static,
    ) -> Self {
        self.register(channel.into(), Arc::new(tool));
        self
    }

    pub fn register(&mut self, channel: ChannelName, tool: Arc<dyn ToolHandler>) {
        let name = tool.definition().name;
        self.channels.entry(channel).or_default().insert(name, tool);
    }

    pub fn has_channel(&self, channel: &ChannelName) -> bool {
        self.channels.contains_key(channel)
    }

    /// Hosted channel names, sorted.
    pub fn channels(&self) -> Vec<ChannelName> {
        let mut names: Vec<_> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get(&self, channel: &ChannelName, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.channels.get(channel)?.get(name).cloned()
    }

    /// Definitions of every tool on `channel`, sorted by name.
    pub fn definitions(&self, channel: &ChannelName) -> Vec<ToolDefinition> {
        self.channels
            .get(channel)
            .map(|tools| tools.values().map(|tool| tool.definition()).collect())
            .unwrap_or_default()
    }
}

/// Returns its arguments unchanged.
pub struct EchoTool;

#[async_trait]
impl ToolHandler for EchoTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "echo".to_string(),
            description: "Return the call arguments unchanged.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "additionalProperties": true
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value, String> {
        Ok(arguments)
    }
}
