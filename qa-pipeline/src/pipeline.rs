//! Retrieve, stuff, generate.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::api_types::{AnswerResult, DocumentFragment};
use crate::backend::PipelineBackend;
use crate::error::{AnswerError, InitError};
use crate::generator::AnswerGenerator;
use crate::prompt::{PromptBuilder, join_fragments};
use crate::retriever::Retriever;

/// Ready-to-use question answering chain. Cheap to clone; immutable after creation.
#[derive(Clone)]
pub struct QaPipeline {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn AnswerGenerator>,
    prompt: PromptBuilder,
    top_k: usize,
}

impl std::fmt::Debug for QaPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaPipeline")
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl QaPipeline {
    /// Loads the retriever, then the generator.
    ///
    /// The generator is not attempted when the index cannot be loaded.
    ///
    /// # Errors
    /// - [`InitError::IndexUnavailable`] from the retriever load
    /// - [`InitError::ModelUnavailable`] from the generator load
    #[instrument(skip_all, fields(top_k = top_k))]
    pub async fn create(backend: &dyn PipelineBackend, top_k: usize) -> Result<Self, InitError> {
        let retriever = backend
            .load_retriever()
            .await
            .map_err(InitError::IndexUnavailable)?;
        let generator = backend
            .load_generator()
            .await
            .map_err(InitError::ModelUnavailable)?;

        info!("QA pipeline ready");
        Ok(Self::from_parts(retriever, generator, top_k))
    }

    /// Assembles a pipeline from already loaded parts.
    pub fn from_parts(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn AnswerGenerator>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            generator,
            prompt: PromptBuilder,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answers one question.
    ///
    /// # Errors
    /// [`AnswerError`] for a failed retrieval or generation; the pipeline
    /// stays usable for the next call.
    #[instrument(skip_all, fields(query_len = query.len()))]
    pub async fn answer(&self, query: &str) -> Result<AnswerResult, AnswerError> {
        let mut sources: Vec<DocumentFragment> = self.retriever.fetch(query, self.top_k).await?;
        sources.truncate(self.top_k);

        let context = join_fragments(sources.iter().map(|f| f.text.as_str()));
        let prompt = self.prompt.build(&context, query);
        debug!(fragments = sources.len(), prompt_len = prompt.as_str().len(), "prompt built");

        let text = self.generator.generate(&prompt).await?;
        Ok(AnswerResult { text, sources })
    }
}
