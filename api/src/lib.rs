//! HTTP/WebSocket surface of the chat backend.
//!
//! - `GET /chat`   WebSocket; one connection is one [`session::ChatSession`]
//! - `GET /health` liveness and open session count

mod core;
mod error_handler;
mod routes;

pub mod session;

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::signal;
use tracing::{error, info};

pub use crate::core::app_state::AppState;
pub use crate::error_handler::{AppError, AppResult};

use crate::routes::{
    chat::chat_route::chat_route, fallback_route::fallback_route,
    health::health_route::health_route,
};

/// Builds the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", get(chat_route))
        .route("/health", get(health_route))
        .fallback(fallback_route)
        .with_state(state)
}

/// Binds `state.address` and serves until Ctrl+C.
///
/// # Errors
/// [`AppError::Bind`] or [`AppError::Server`].
pub async fn start(state: AppState) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(&state.address)
        .await
        .map_err(|source| AppError::Bind {
            address: state.address.clone(),
            source,
        })?;
    info!(address = %state.address, "listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::extract::State;
    use axum::response::IntoResponse;
    use futures_util::{SinkExt, StreamExt};
    use qa_pipeline::{
        AnswerGenerator, AnswerResult, DocumentFragment, InferenceError, ModelError,
        PipelineBackend, Prompt, Retriever,
    };
    use rag_store::RagError;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    struct NeverBackend;

    #[async_trait]
    impl PipelineBackend for NeverBackend {
        async fn load_retriever(&self) -> Result<Arc<dyn Retriever>, RagError> {
            Err(RagError::DeserializationDisabled)
        }
        async fn load_generator(&self) -> Result<Arc<dyn AnswerGenerator>, ModelError> {
            unreachable!("index never loads")
        }
    }

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(
            "127.0.0.1:0".into(),
            Arc::new(NeverBackend),
            session::ChatConfig::default(),
        ))
    }

    #[tokio::test]
    async fn health_reports_open_sessions() {
        let st = state();
        let _g = st.session_opened();
        let axum::Json(body) = health_route(State(st.clone())).await;
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"success": true, "data": {"status": "ok", "active_sessions": 1}})
        );
    }

    #[tokio::test]
    async fn unknown_path_is_404_envelope() {
        let resp = fallback_route("/nope".parse().unwrap()).await.into_response();
        assert_eq!(resp.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn router_builds() {
        let _ = router(state());
    }

    /* ---- /chat over a real socket ---- */

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn connect(state: Arc<AppState>) -> Client {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router(state)).await.unwrap() });
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/chat"))
            .await
            .unwrap();
        ws
    }

    async fn next_event(ws: &mut Client) -> Value {
        let msg = ws.next().await.unwrap().unwrap();
        serde_json::from_str(msg.to_text().unwrap()).unwrap()
    }

    async fn wait_for_no_sessions(st: &AppState) {
        for _ in 0..200 {
            if st.active_sessions() == 0 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("session still open: {}", st.active_sessions());
    }

    fn gout_fragment() -> DocumentFragment {
        DocumentFragment {
            text: "Gout is a form of arthritis.".into(),
            source: "gale.pdf".into(),
            page: Some(412),
            score: 0.9,
        }
    }

    struct OneFragment;

    #[async_trait]
    impl Retriever for OneFragment {
        async fn fetch(&self, _q: &str, _k: usize) -> Result<Vec<DocumentFragment>, RagError> {
            Ok(vec![gout_fragment()])
        }
    }

    /// Numbers its answers so reply order is visible.
    #[derive(Default)]
    struct CountingGenerator(AtomicUsize);

    #[async_trait]
    impl AnswerGenerator for CountingGenerator {
        async fn generate(&self, _p: &Prompt) -> Result<String, InferenceError> {
            Ok(format!("answer {}", self.0.fetch_add(1, Ordering::SeqCst) + 1))
        }
    }

    struct ReadyBackend;

    #[async_trait]
    impl PipelineBackend for ReadyBackend {
        async fn load_retriever(&self) -> Result<Arc<dyn Retriever>, RagError> {
            Ok(Arc::new(OneFragment))
        }
        async fn load_generator(&self) -> Result<Arc<dyn AnswerGenerator>, ModelError> {
            Ok(Arc::new(CountingGenerator::default()))
        }
    }

    fn reply(text: &str) -> String {
        session::format_reply(&AnswerResult {
            text: text.into(),
            sources: vec![gout_fragment()],
        })
    }

    #[tokio::test]
    async fn failed_session_over_websocket() {
        let st = state();
        let mut ws = connect(st.clone()).await;
        let welcome = session::ChatConfig::default().welcome_text();

        assert_eq!(
            next_event(&mut ws).await,
            json!({"type": "message", "id": 1, "content": session::STARTING_TEXT})
        );
        assert_eq!(
            next_event(&mut ws).await,
            json!({"type": "update", "id": 1, "content": welcome})
        );

        ws.send(WsMessage::Ping(b"p".to_vec().into())).await.unwrap();
        assert_eq!(
            ws.next().await.unwrap().unwrap(),
            WsMessage::Pong(b"p".to_vec().into())
        );

        ws.send(WsMessage::text("What is gout?")).await.unwrap();
        assert_eq!(
            next_event(&mut ws).await,
            json!({"type": "message", "id": 2, "content": session::INIT_FAILED_TEXT})
        );

        // blank text still gets its reply
        ws.send(WsMessage::text("  ")).await.unwrap();
        assert_eq!(
            next_event(&mut ws).await,
            json!({"type": "message", "id": 3, "content": session::INIT_FAILED_TEXT})
        );

        ws.close(None).await.unwrap();
        wait_for_no_sessions(&st).await;
    }

    #[tokio::test]
    async fn ready_session_replies_in_order() {
        let st = Arc::new(AppState::new(
            "127.0.0.1:0".into(),
            Arc::new(ReadyBackend),
            session::ChatConfig::default(),
        ));
        let mut ws = connect(st.clone()).await;

        assert_eq!(next_event(&mut ws).await["id"], 1);
        assert_eq!(next_event(&mut ws).await["type"], "update");

        ws.send(WsMessage::text(r#"{"type":"message","content":"What is gout?"}"#))
            .await
            .unwrap();
        ws.send(WsMessage::text("How is it treated?")).await.unwrap();

        assert_eq!(
            next_event(&mut ws).await,
            json!({"type": "message", "id": 2, "content": reply("answer 1")})
        );
        assert_eq!(
            next_event(&mut ws).await,
            json!({"type": "message", "id": 3, "content": reply("answer 2")})
        );
        assert_eq!(st.active_sessions(), 1);

        ws.close(None).await.unwrap();
        wait_for_no_sessions(&st).await;
    }
}
