//! Outbound side of a chat: post a message, later replace its content.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Handle to a message already shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user is no longer reachable.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("chat connection closed")]
    Closed,

    #[error("failed to encode outbound event: {0}")]
    Encode(String),
}

/// Where session replies go.
#[async_trait]
pub trait ChatSink: Send {
    async fn send_message(&mut self, text: &str) -> Result<MessageId, SinkError>;
    async fn update_message(&mut self, id: MessageId, text: &str) -> Result<(), SinkError>;
}
