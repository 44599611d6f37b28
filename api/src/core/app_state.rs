use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ai_llm_service::error_handler::{EnvSource, env_opt, must_env};
use ai_llm_service::service_profiles::LlmServiceProfiles;
use qa_pipeline::{LocalBackend, PipelineBackend, QaConfig};
use tracing::info;

use crate::error_handler::AppResult;
use crate::session::{ChatConfig, DEFAULT_BOT_NAME};

/// Shared state for all handlers.
pub struct AppState {
    /// Bind address, e.g. "0.0.0.0:8000".
    pub address: String,
    /// Builds a fresh pipeline for every session.
    pub backend: Arc<dyn PipelineBackend>,
    pub chat: ChatConfig,
    active_sessions: AtomicUsize,
}

impl AppState {
    pub fn new(address: String, backend: Arc<dyn PipelineBackend>, chat: ChatConfig) -> Self {
        Self {
            address,
            backend,
            chat,
            active_sessions: AtomicUsize::new(0),
        }
    }

    /// Load shared state from environment variables.
    ///
    /// # Errors
    /// [`crate::error_handler::AppError::Config`] for missing or malformed variables.
    pub fn from_env(src: &dyn EnvSource) -> AppResult<Self> {
        let address = must_env(src, "API_ADDRESS")?;
        let llm = Arc::new(LlmServiceProfiles::from_env(src)?);
        let qa = QaConfig::from_env(src)?;

        let chat = ChatConfig {
            bot_name: env_opt(src, "BOT_NAME").unwrap_or_else(|| DEFAULT_BOT_NAME.to_string()),
            top_k: usize::try_from(qa.top_k).unwrap_or(usize::MAX),
        };

        info!(
            address = %address,
            index = ?qa.index.backend,
            top_k = chat.top_k,
            bot_name = %chat.bot_name,
            "configuration loaded"
        );

        Ok(Self::new(address, Arc::new(LocalBackend::new(qa, llm)), chat))
    }

    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Relaxed)
    }

    /// Counts a session as open until the guard is dropped.
    pub fn session_opened(&self) -> SessionGuard<'_> {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
        SessionGuard(&self.active_sessions)
    }
}

pub struct SessionGuard<'a>(&'a AtomicUsize);

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}
