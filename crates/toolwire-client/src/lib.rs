//! Client side of the tool-server protocol: one long-lived SSE stream per
//! channel for responses, HTTP POSTs for requests, and id-based correlation
//! between the two.

pub mod channel;
pub mod config;
pub mod invoker;
mod reader;
pub mod router;
pub mod session;

pub use config::ClientConfig;
pub use invoker::{HealthStatus, ToolClient};
pub use router::ResponseRouter;
pub use session::{SessionRegistry, ShutdownReport};
