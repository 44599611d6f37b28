//! Retrieval-augmented question answering.
//!
//! [`QaPipeline::create`] loads the persisted index ([`Retriever`]) and then
//! the language model ([`AnswerGenerator`]); [`QaPipeline::answer`] retrieves
//! the top-k fragments, stuffs them into a fixed prompt and returns the
//! completion together with the fragments used.

mod api_types;
mod backend;
mod error;
mod generator;
mod pipeline;
mod retriever;

pub mod cfg;
pub mod prompt;

pub use api_types::{AnswerResult, DocumentFragment};
pub use backend::{LocalBackend, PipelineBackend};
pub use cfg::QaConfig;
pub use error::{AnswerError, InferenceError, InitError, ModelError};
pub use generator::{AnswerGenerator, OllamaGenerator};
pub use pipeline::QaPipeline;
pub use prompt::{Prompt, PromptBuilder};
pub use retriever::{Retriever, StoreRetriever};
