//! Typed errors for the qa-pipeline crate.

use ai_llm_service::{ModelArtifactError, OllamaError};
use rag_store::RagError;
use thiserror::Error;

/// Why the language model could not be made ready.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Local weights file missing or in a format the runtime cannot load.
    #[error("model file: {0}")]
    Artifact(#[from] ModelArtifactError),

    /// The runtime does not know the model or failed to load it.
    #[error("model runtime: {0}")]
    Runtime(#[from] OllamaError),
}

/// Pipeline construction failure. Fatal for the session that hit it.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("index unavailable: {0}")]
    IndexUnavailable(#[source] RagError),

    #[error("model unavailable: {0}")]
    ModelUnavailable(#[source] ModelError),
}

/// A single generation call failed.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("generation failed: {0}")]
    Ollama(#[from] OllamaError),

    #[error("model returned an empty completion")]
    EmptyCompletion,
}

/// Per-request failure of [`crate::QaPipeline::answer`]. The pipeline stays usable.
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RagError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl AnswerError {
    /// Stage name for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            AnswerError::Retrieval(_) => "retrieval",
            AnswerError::Inference(_) => "inference",
        }
    }
}
