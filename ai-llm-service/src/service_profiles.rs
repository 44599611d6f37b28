//! Shared LLM service with two profiles: `generation` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Builds one HTTP client per distinct profile; identical profiles share a client.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::error_handler::ProcessEnv;
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let svc = Arc::new(LlmServiceProfiles::from_env(&ProcessEnv)?);
//!
//!     let txt = svc.generation_client().generate("Hello world").await?;
//!     println!("{txt}");
//!
//!     let emb = svc.embed("Ferris").await?;
//!     println!("Embedding dim = {}", emb.len());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::config::default_config::{config_ollama_embedding, config_ollama_generation};
use crate::config::llm_model_config::LlmModelConfig;
use crate::error_handler::{AiLlmError, EnvSource};
use crate::services::ollama_service::OllamaService;

/// Shared service that manages the **generation** and **embedding** profiles.
pub struct LlmServiceProfiles {
    generation: Arc<OllamaService>,
    embedding: Arc<OllamaService>,
}

impl std::fmt::Debug for LlmServiceProfiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmServiceProfiles")
            .field("generation", self.generation.config())
            .field("embedding", self.embedding.config())
            .finish()
    }
}

impl LlmServiceProfiles {
    /// Creates the service from two explicit profiles.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if a client cannot be built (bad endpoint, TLS init).
    pub fn new(generation: LlmModelConfig, embedding: LlmModelConfig) -> Result<Self, AiLlmError> {
        let generation = Arc::new(OllamaService::new(generation)?);
        let embedding = if embedding == *generation.config() {
            generation.clone()
        } else {
            Arc::new(OllamaService::new(embedding)?)
        };

        info!(
            generation_model = generation.model(),
            embedding_model = embedding.model(),
            endpoint = %generation.config().endpoint,
            "LLM profiles initialized"
        );

        Ok(Self {
            generation,
            embedding,
        })
    }

    /// Reads both profiles from the environment (see [`crate::config::default_config`]).
    ///
    /// # Errors
    /// Returns [`AiLlmError::Config`] for missing or malformed variables.
    pub fn from_env(src: &dyn EnvSource) -> Result<Self, AiLlmError> {
        Self::new(config_ollama_generation(src)?, config_ollama_embedding(src)?)
    }

    /// Computes one embedding with the embedding profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError::Ollama`] if the call fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        Ok(self.embedding.embeddings(input).await?)
    }

    /// Client bound to the generation profile.
    pub fn generation_client(&self) -> Arc<OllamaService> {
        self.generation.clone()
    }

    /// Client bound to the embedding profile.
    pub fn embedding_client(&self) -> Arc<OllamaService> {
        self.embedding.clone()
    }

    /// Returns references to the current profiles `(generation, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (self.generation.config(), self.embedding.config())
    }
}
