//! Ollama access for the chat backend.
//!
//! Exposes a generation profile (fixed `max_new_tokens` / `temperature`),
//! an embedding profile, model existence/preload calls, a GGUF pre-flight
//! check for local weights, env-driven config and the process-wide tracing
//! setup.

pub mod config;
pub mod error_handler;
pub mod model_artifact;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use error_handler::{AiLlmError, ModelArtifactError, OllamaError};
pub use service_profiles::LlmServiceProfiles;
pub use services::ollama_service::OllamaService;
