pub mod content;
pub mod frame;
pub mod jsonrpc;
pub mod tools;

pub use frame::{Frame, FrameError, ResponseFrame};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use tools::ToolDefinition;
