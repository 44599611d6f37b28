//! High-level RAG facade: open a persisted index and retrieve top‑K context.
//!
//! This crate provides a small API to:
//! - Open a prebuilt index (local HNSW directory or Qdrant collection) and
//!   validate it against its manifest and the configured embedding model
//! - Retrieve top‑K hits for a textual query via an [`EmbeddingsProvider`]
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod config;
mod embed;
mod errors;
mod hnsw_index;
mod qdrant_facade;
mod record;

pub use config::{DistanceKind, IndexBackend, IndexConfig, QdrantConfig};
pub use embed::EmbeddingsProvider;
pub use embed::ollama::{OllamaConfig, OllamaEmbedder};
pub use errors::RagError;
pub use hnsw_index::{CHUNKS_FILE, HnswIndex, IndexMetadata, METADATA_FILE};
pub use record::{RagHit, RagQuery, RagRecord};

use std::sync::Arc;

use tracing::{debug, info, instrument, trace};

use crate::qdrant_facade::QdrantFacade;

enum Backend {
    Hnsw(Arc<HnswIndex>),
    Qdrant(QdrantFacade),
}

/// Opened, immutable index handle.
///
/// This is the single entry point recommended for application code.
pub struct RagStore {
    backend: Backend,
}

impl std::fmt::Debug for RagStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.backend {
            Backend::Hnsw(_) => "hnsw",
            Backend::Qdrant(_) => "qdrant",
        };
        f.debug_struct("RagStore")
            .field("backend", &kind)
            .field("dimension", &self.dimension())
            .finish()
    }
}

impl RagStore {
    /// Opens the index described by `cfg`.
    ///
    /// The local backend reads, validates and builds its graph on the blocking pool.
    ///
    /// # Errors
    /// - [`RagError::DeserializationDisabled`] if loading is not permitted
    /// - [`RagError::NotFound`], [`RagError::Parse`], [`RagError::SchemaMismatch`],
    ///   [`RagError::VectorSizeMismatch`] for unusable index content
    /// - [`RagError::Qdrant`] for client failures
    #[instrument(skip_all)]
    pub async fn open(cfg: &IndexConfig) -> Result<Self, RagError> {
        cfg.validate()?;
        if !cfg.allow_deserialization {
            return Err(RagError::DeserializationDisabled);
        }

        let backend = match &cfg.backend {
            IndexBackend::Local { path } => {
                let path = path.clone();
                let model = cfg.embedding_model.clone();
                let index = tokio::task::spawn_blocking(move || {
                    HnswIndex::load(&path, model.as_deref())
                })
                .await??;
                Backend::Hnsw(Arc::new(index))
            }
            IndexBackend::Qdrant(q) => Backend::Qdrant(QdrantFacade::open(q).await?),
        };

        let store = Self { backend };
        info!(store = ?store, "index opened");
        Ok(store)
    }

    /// Vector size every query must have.
    pub fn dimension(&self) -> usize {
        match &self.backend {
            Backend::Hnsw(idx) => idx.dimension(),
            Backend::Qdrant(q) => q.dimension(),
        }
    }

    /// Embeds a probe text and checks the vector size against the index.
    ///
    /// # Errors
    /// [`RagError::VectorSizeMismatch`] or the provider's error.
    pub async fn verify_provider(&self, provider: &dyn EmbeddingsProvider) -> Result<(), RagError> {
        let probe = provider.embed("dimension probe").await?;
        if probe.len() != self.dimension() {
            return Err(RagError::VectorSizeMismatch {
                got: probe.len(),
                want: self.dimension(),
            });
        }
        debug!(dimension = probe.len(), "embedding provider matches index");
        Ok(())
    }

    /// Performs a vector search and returns hits ordered by descending score.
    ///
    /// # Errors
    /// [`RagError::VectorSizeMismatch`], [`RagError::Qdrant`] or [`RagError::Join`].
    pub async fn search_by_vector(
        &self,
        query_vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<RagHit>, RagError> {
        trace!("RagStore::search_by_vector top_k={top_k}");
        match &self.backend {
            Backend::Hnsw(idx) => {
                let idx = Arc::clone(idx);
                let k = usize::try_from(top_k).unwrap_or(usize::MAX);
                tokio::task::spawn_blocking(move || idx.search(&query_vector, k)).await?
            }
            Backend::Qdrant(q) => q.search(query_vector, top_k).await,
        }
    }

    /// Builds RAG context for a textual query using the provided embedding provider.
    ///
    /// # Errors
    /// Returns embedding errors or search failures.
    #[instrument(skip_all, fields(top_k = query.top_k))]
    pub async fn rag_context(
        &self,
        query: RagQuery<'_>,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<Vec<RagHit>, RagError> {
        let qv = provider.embed(query.text).await?;
        let mut hits = self.search_by_vector(qv, query.top_k).await?;
        hits.truncate(usize::try_from(query.top_k).unwrap_or(usize::MAX));
        trace!("RagStore::rag_context hits={}", hits.len());
        Ok(hits)
    }
}
