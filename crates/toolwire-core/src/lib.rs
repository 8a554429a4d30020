pub mod error;
pub mod ids;
pub mod traits;
pub mod types;

pub use error::{FailureKind, ToolError};
pub use ids::{ContentHashIds, RandomIds};
pub use traits::RequestIdStrategy;
pub use types::{ChannelName, PendingRequest, RequestId, Session, SessionId, ToolOutput};
