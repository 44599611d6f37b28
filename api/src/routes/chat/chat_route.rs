use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::{
    core::app_state::AppState,
    routes::chat::{chat_events::parse_client_text, ws_sink::WsSink},
    session::ChatSession,
};

/// `GET /chat`: one WebSocket connection is one chat session.
pub async fn chat_route(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| {
        let session_id = Uuid::new_v4();
        run_session(socket, state).instrument(info_span!("chat_session", %session_id))
    })
}

async fn run_session(socket: WebSocket, state: Arc<AppState>) {
    let _active = state.session_opened();
    let mut sink = WsSink::new(socket);
    info!("session started");

    let session =
        match ChatSession::start(state.backend.as_ref(), state.chat.clone(), &mut sink).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "client left during start");
                return;
            }
        };

    // one message at a time: the next frame is read only after the reply is sent
    while let Some(frame) = sink.recv().await {
        match frame {
            Ok(Message::Text(raw)) => {
                let text = parse_client_text(raw.as_str());
                debug!(len = text.len(), "message received");
                if let Err(e) = session.on_message(&text, &mut sink).await {
                    warn!(error = %e, "reply not delivered");
                    break;
                }
            }
            Ok(Message::Ping(data)) => {
                if sink.send_raw(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "websocket error");
                break;
            }
        }
    }

    info!("session ended");
}
