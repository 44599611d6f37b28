//! Similarity retrieval over the persisted index.

use std::sync::Arc;

use ai_llm_service::service_profiles::LlmServiceProfiles;
use async_trait::async_trait;
use rag_store::{
    IndexConfig, OllamaConfig, OllamaEmbedder, RagError, RagQuery, RagStore,
};
use tracing::{debug, instrument};

use crate::api_types::DocumentFragment;

/// Returns the `k` fragments most similar to a query.
///
/// Results are ordered by descending similarity and never longer than `k`.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn fetch(&self, query: &str, k: usize) -> Result<Vec<DocumentFragment>, RagError>;
}

/// [`Retriever`] backed by a [`RagStore`] and the Ollama embedding profile.
#[derive(Debug)]
pub struct StoreRetriever {
    store: RagStore,
    embedder: OllamaEmbedder,
}

impl StoreRetriever {
    /// Opens the index and checks that the embedding model produces vectors
    /// of the index dimension.
    ///
    /// # Errors
    /// Any [`RagError`] from opening the index or from the probe embedding.
    #[instrument(skip_all)]
    pub async fn load(cfg: &IndexConfig, llm: Arc<LlmServiceProfiles>) -> Result<Self, RagError> {
        let store = RagStore::open(cfg).await?;
        let embedder = OllamaEmbedder::new(OllamaConfig {
            svc: llm,
            dim: store.dimension(),
        });
        store.verify_provider(&embedder).await?;
        Ok(Self { store, embedder })
    }
}

#[async_trait]
impl Retriever for StoreRetriever {
    #[instrument(skip_all, fields(k = k))]
    async fn fetch(&self, query: &str, k: usize) -> Result<Vec<DocumentFragment>, RagError> {
        let hits = self
            .store
            .rag_context(
                RagQuery {
                    text: query,
                    top_k: k as u64,
                },
                &self.embedder,
            )
            .await?;
        debug!(hits = hits.len(), "retrieved");
        Ok(hits.into_iter().take(k).map(DocumentFragment::from).collect())
    }
}
