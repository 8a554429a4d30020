use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Definition of a tool as listed by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Parse the `tools` array of a `tools/list` result.
    ///
    /// # Errors
    ///
    /// Returns an error if `result.tools` is missing or malformed.
    pub fn list_from_result(result: &Value) -> Result<Vec<Self>, serde_json::Error> {
        let tools = result.get("tools").cloned().unwrap_or(Value::Null);
        serde_json::from_value(tools)
    }
}
