mod health;
mod messages;
mod sse;

pub use health::health;
pub use messages::{dispatch, post_message};
pub use sse::channel_sse;
