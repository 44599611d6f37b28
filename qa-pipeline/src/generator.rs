//! Answer generation through the local inference runtime.

use std::path::Path;
use std::sync::Arc;

use ai_llm_service::OllamaService;
use ai_llm_service::model_artifact::verify_gguf;
use async_trait::async_trait;
use tracing::{info, instrument};

use crate::error::{InferenceError, ModelError};
use crate::prompt::Prompt;

/// Produces completion text for a prompt.
///
/// Sampling parameters are fixed when the generator is built.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<String, InferenceError>;
}

/// [`AnswerGenerator`] calling Ollama's `/api/generate`.
pub struct OllamaGenerator {
    svc: Arc<OllamaService>,
}

impl OllamaGenerator {
    /// Makes the model ready before the first question.
    ///
    /// 1. verifies `model_path` is a GGUF file (if given)
    /// 2. asks the runtime whether it knows the model
    /// 3. loads the model into memory
    ///
    /// # Errors
    /// [`ModelError`] from whichever step failed.
    #[instrument(skip_all, fields(model = %svc.model()))]
    pub async fn load(svc: Arc<OllamaService>, model_path: Option<&Path>) -> Result<Self, ModelError> {
        if let Some(path) = model_path {
            verify_gguf(path).await?;
        }
        let details = svc.show_model().await?;
        svc.preload().await?;
        info!(
            format = details.format.as_deref().unwrap_or("?"),
            parameters = details.parameter_size.as_deref().unwrap_or("?"),
            quantization = details.quantization_level.as_deref().unwrap_or("?"),
            "model ready"
        );
        Ok(Self { svc })
    }
}

#[async_trait]
impl AnswerGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String, InferenceError> {
        let text = self.svc.generate(prompt.as_str()).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(InferenceError::EmptyCompletion);
        }
        Ok(text.to_string())
    }
}
