use serde_json::Value;

use crate::types::RequestId;

/// Produces the id a request is tagged with, and later matched by.
///
/// Ids only need to be unique among in-flight requests of one channel.
pub trait RequestIdStrategy: Send + Sync {
    /// Generate the id for a call of `tool` with `arguments`.
    fn request_id(&self, tool: &str, arguments: &Value) -> RequestId;
}
