//! Lightweight Ollama service for text generation, embeddings and model loading.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/generate`: synchronous text generation (`stream=false`)
//! - `POST {endpoint}/api/generate` without a prompt: loads the model into memory
//! - `POST {endpoint}/api/embed`: embeddings retrieval
//! - `POST {endpoint}/api/show`: model metadata (existence check)
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::config::llm_model_config::LlmModelConfig;
//! use ai_llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     model: "llama2:7b-chat-q8_0".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     max_tokens: Some(512),
//!     temperature: Some(0.5),
//!     top_p: None,
//!     timeout_secs: None,
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//! svc.preload().await?;
//! let text = svc.generate("What is hypertension?").await?;
//! println!("Generated:\n{}", text);
//! # Ok(()) }
//! ```

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::llm_model_config::LlmModelConfig;
use crate::error_handler::{OllamaError, make_snippet};

/// Result alias for Ollama operations.
pub type Result<T> = std::result::Result<T, OllamaError>;

/// Metadata returned by `/api/show`, reduced to what we log.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub parameter_size: Option<String>,
    #[serde(default)]
    pub quantization_level: Option<String>,
}

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses one HTTP client; a
/// timeout is applied only when the config carries one.
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    url_embed: String,
    url_show: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - [`OllamaError::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`OllamaError::Transport`] if HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(OllamaError::InvalidEndpoint(cfg.endpoint));
        }

        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .deflate(true);
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_generate = format!("{base}/api/generate");
        let url_embed = format!("{base}/api/embed");
        let url_show = format!("{base}/api/show");

        Ok(Self {
            client,
            cfg,
            url_generate,
            url_embed,
            url_show,
        })
    }

    /// Model tag this client talks to.
    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    /// The profile this client was built from.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Performs a **non-streaming** generation request via `/api/generate`.
    ///
    /// Mapped options:
    /// - `num_predict`  ← `self.cfg.max_tokens`
    /// - `temperature`  ← `self.cfg.temperature`
    /// - `top_p`        ← `self.cfg.top_p`
    ///
    /// # Errors
    /// - [`OllamaError::HttpStatus`] for non-2xx responses
    /// - [`OllamaError::Transport`] for client errors
    /// - [`OllamaError::Decode`] if response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model, prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt);
        let out: GenerateResponse = self.post_json(&self.url_generate, &body).await?;
        debug!(chars = out.response.len(), "generation finished");
        Ok(out.response)
    }

    /// Loads the model into the runtime's memory.
    ///
    /// Ollama loads a model when `/api/generate` is called without a prompt;
    /// missing or unloadable weights surface here instead of on the first
    /// user question.
    ///
    /// # Errors
    /// - [`OllamaError::ModelNotFound`] if the server does not know the model
    /// - any transport/status/decode error otherwise
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn preload(&self) -> Result<()> {
        let body = PreloadRequest {
            model: &self.cfg.model,
            stream: false,
        };
        let _: PreloadResponse = self
            .post_json(&self.url_generate, &body)
            .await
            .map_err(|e| self.not_found_as_missing_model(e))?;
        debug!("model loaded");
        Ok(())
    }

    /// Fetches model metadata via `/api/show`.
    ///
    /// # Errors
    /// - [`OllamaError::ModelNotFound`] on `404`
    /// - any transport/status/decode error otherwise
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn show_model(&self) -> Result<ModelDetails> {
        let body = ShowRequest {
            model: &self.cfg.model,
        };
        let out: ShowResponse = self
            .post_json(&self.url_show, &body)
            .await
            .map_err(|e| self.not_found_as_missing_model(e))?;
        Ok(out.details)
    }

    /// Retrieves one embedding via `/api/embed`.
    ///
    /// # Errors
    /// - [`OllamaError::HttpStatus`] for non-2xx responses
    /// - [`OllamaError::Transport`] for client errors
    /// - [`OllamaError::Decode`] if response cannot be parsed or is empty
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>> {
        let body = EmbedRequest {
            model: &self.cfg.model,
            input,
        };
        let out: EmbedResponse = self.post_json(&self.url_embed, &body).await?;
        out.embeddings
            .into_iter()
            .next()
            .ok_or_else(|| OllamaError::Decode("`embeddings` array is empty".into()))
    }

    /* --------------------- Internals --------------------- */

    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("POST {url}");
        let resp = self.client.post(url).json(body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(OllamaError::HttpStatus {
                status,
                url: url.to_string(),
                snippet: make_snippet(&text),
            });
        }

        resp.json::<R>()
            .await
            .map_err(|e| OllamaError::Decode(format!("serde error: {e}; url={url}")))
    }

    fn not_found_as_missing_model(&self, err: OllamaError) -> OllamaError {
        if err.is_not_found() {
            OllamaError::ModelNotFound(self.cfg.model.clone())
        } else {
            err
        }
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate` (non-streaming).
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

impl<'a> GenerateRequest<'a> {
    /// Builds a request from config and prompt.
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str) -> Self {
        let options = GenerateOptions {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        };

        Self {
            model: &cfg.model,
            prompt,
            stream: false,
            options: Some(options),
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response body for `/api/generate`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct PreloadRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct PreloadResponse {
    #[allow(dead_code)]
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShowResponse {
    #[serde(default)]
    details: ModelDetails,
}

/// Request body for `/api/embed`.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response body for `/api/embed`.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(endpoint: &str) -> LlmModelConfig {
        LlmModelConfig {
            model: "llama2".into(),
            endpoint: endpoint.into(),
            max_tokens: Some(512),
            temperature: Some(0.5),
            top_p: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn rejects_endpoint_without_scheme() {
        assert!(matches!(
            OllamaService::new(cfg("localhost:11434")),
            Err(OllamaError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn builds_api_urls_from_base() {
        let svc = OllamaService::new(cfg("http://localhost:11434/")).unwrap();
        assert_eq!(svc.url_generate, "http://localhost:11434/api/generate");
        assert_eq!(svc.url_embed, "http://localhost:11434/api/embed");
        assert_eq!(svc.url_show, "http://localhost:11434/api/show");
        assert_eq!(svc.model(), "llama2");
    }

    #[test]
    fn generate_request_carries_fixed_sampling_options() {
        let c = cfg("http://localhost:11434");
        let body = serde_json::to_value(GenerateRequest::from_cfg(&c, "hi")).unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 512);
        assert_eq!(body["options"]["temperature"], 0.5);
        assert!(body["options"].get("top_p").is_none());
    }

    #[test]
    fn missing_model_maps_from_404() {
        let svc = OllamaService::new(cfg("http://localhost:11434")).unwrap();
        let err = svc.not_found_as_missing_model(OllamaError::HttpStatus {
            status: reqwest::StatusCode::NOT_FOUND,
            url: svc.url_show.clone(),
            snippet: "model 'llama2' not found".into(),
        });
        assert!(matches!(err, OllamaError::ModelNotFound(m) if m == "llama2"));
    }
}
