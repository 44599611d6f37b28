use serde::{Deserialize, Serialize};

/// Inbound frame: `{"type":"message","content":"..."}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Message { content: String },
}

/// Outbound frame.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent<'a> {
    /// A new message in the conversation.
    Message { id: u64, content: &'a str },
    /// Replaces the content of an earlier message.
    Update { id: u64, content: &'a str },
}

/// Extracts the user's text from a text frame.
///
/// Frames that are not a [`ClientEvent`] are taken verbatim. Blank text is
/// returned as is; every frame gets a reply.
pub fn parse_client_text(raw: &str) -> String {
    match serde_json::from_str::<ClientEvent>(raw) {
        Ok(ClientEvent::Message { content }) => content,
        Err(_) => raw.to_string(),
    }
}
