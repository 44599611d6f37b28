use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};

use crate::routes::chat::chat_events::ServerEvent;
use crate::session::sink::{ChatSink, MessageId, SinkError};

/// [`ChatSink`] writing JSON events to a WebSocket it owns.
pub struct WsSink {
    socket: WebSocket,
    next_id: u64,
}

impl WsSink {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket, next_id: 1 }
    }

    /// Next inbound frame; `None` once the client is gone.
    pub async fn recv(&mut self) -> Option<Result<Message, axum::Error>> {
        self.socket.recv().await
    }

    /// Sends a raw frame (pongs).
    pub async fn send_raw(&mut self, msg: Message) -> Result<(), SinkError> {
        self.socket.send(msg).await.map_err(|_| SinkError::Closed)
    }

    async fn send_event(&mut self, ev: &ServerEvent<'_>) -> Result<(), SinkError> {
        let body = serde_json::to_string(ev).map_err(|e| SinkError::Encode(e.to_string()))?;
        self.send_raw(Message::Text(body.into())).await
    }
}

#[async_trait]
impl ChatSink for WsSink {
    async fn send_message(&mut self, text: &str) -> Result<MessageId, SinkError> {
        let id = self.next_id;
        self.next_id += 1;
        self.send_event(&ServerEvent::Message { id, content: text })
            .await?;
        Ok(MessageId(id))
    }

    async fn update_message(&mut self, id: MessageId, text: &str) -> Result<(), SinkError> {
        self.send_event(&ServerEvent::Update {
            id: id.0,
            content: text,
        })
        .await
    }
}
