//! Where the pipeline gets its retriever and generator from.

use std::sync::Arc;

use ai_llm_service::service_profiles::LlmServiceProfiles;
use async_trait::async_trait;
use rag_store::RagError;

use crate::cfg::QaConfig;
use crate::error::ModelError;
use crate::generator::{AnswerGenerator, OllamaGenerator};
use crate::retriever::{Retriever, StoreRetriever};

/// Loads the two heavy resources a pipeline needs.
#[async_trait]
pub trait PipelineBackend: Send + Sync {
    async fn load_retriever(&self) -> Result<Arc<dyn Retriever>, RagError>;
    async fn load_generator(&self) -> Result<Arc<dyn AnswerGenerator>, ModelError>;
}

/// Production backend: configured index + Ollama profiles.
#[derive(Clone, Debug)]
pub struct LocalBackend {
    cfg: QaConfig,
    llm: Arc<LlmServiceProfiles>,
}

impl LocalBackend {
    pub fn new(cfg: QaConfig, llm: Arc<LlmServiceProfiles>) -> Self {
        Self { cfg, llm }
    }

    pub fn config(&self) -> &QaConfig {
        &self.cfg
    }
}

#[async_trait]
impl PipelineBackend for LocalBackend {
    async fn load_retriever(&self) -> Result<Arc<dyn Retriever>, RagError> {
        let r = StoreRetriever::load(&self.cfg.index, Arc::clone(&self.llm)).await?;
        Ok(Arc::new(r))
    }

    async fn load_generator(&self) -> Result<Arc<dyn AnswerGenerator>, ModelError> {
        let g = OllamaGenerator::load(self.llm.generation_client(), self.cfg.model_path.as_deref())
            .await?;
        Ok(Arc::new(g))
    }
}
