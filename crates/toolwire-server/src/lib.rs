pub mod app_state;
pub mod handlers;
pub mod router;
pub mod session;
pub mod tools;

pub use app_state::AppState;
pub use tools::{EchoTool, ToolHandler, ToolHost};
