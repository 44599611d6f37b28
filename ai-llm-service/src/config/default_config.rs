//! Default model configs loaded from environment variables.
//!
//! Two roles are supported, both served by **Ollama**:
//!
//! - **Generation** → the chat model that writes the final answer
//! - **Embedding**  → the model that turns text into vectors for the index
//!
//! # Environment variables
//!
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = generation model (mandatory)
//! - `LLM_MAX_TOKENS`              = max new tokens (default 512)
//! - `LLM_TEMPERATURE`             = sampling temperature (default 0.5)
//! - `EMBEDDING_MODEL`             = embedding model (mandatory)
//! - `EMBEDDING_TIMEOUT_SECS`      = embedding request timeout (default 30)

use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::{
        AiLlmError, ConfigError, EnvSource, env_opt, env_opt_f32, env_opt_u32, env_opt_u64,
        must_env, validate_http_endpoint, validate_range_f32,
    },
};

/// Default cap on generated tokens.
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 512;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
/// Default embedding request timeout.
pub const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 30;

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
///
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
/// - [`ConfigError::InvalidFormat`] if `OLLAMA_URL` has no http(s) scheme
fn ollama_endpoint(src: &dyn EnvSource) -> Result<String, AiLlmError> {
    if let Some(url) = env_opt(src, "OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = env_opt(src, "OLLAMA_PORT") {
        port.parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

/// Constructs the config for the **generation** model.
///
/// No request timeout is set: a generation call runs until the runtime
/// finishes or fails.
///
/// # Env
/// - `OLLAMA_MODEL` (required)
/// - `LLM_MAX_TOKENS`, `LLM_TEMPERATURE` (optional)
pub fn config_ollama_generation(src: &dyn EnvSource) -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint(src)?;
    let model = must_env(src, "OLLAMA_MODEL")?;
    let max_tokens = env_opt_u32(src, "LLM_MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_NEW_TOKENS);
    let temperature = env_opt_f32(src, "LLM_TEMPERATURE")?.unwrap_or(DEFAULT_TEMPERATURE);
    validate_range_f32("temperature", temperature, 0.0, 2.0)?;

    Ok(LlmModelConfig {
        model,
        endpoint,
        max_tokens: Some(max_tokens),
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: None,
    })
}

/// Constructs the config for the **embedding** model.
///
/// # Env
/// - `EMBEDDING_MODEL` (required)
/// - `EMBEDDING_TIMEOUT_SECS` (optional)
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `max_tokens = None`
pub fn config_ollama_embedding(src: &dyn EnvSource) -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint(src)?;
    let model = must_env(src, "EMBEDDING_MODEL")?;
    let timeout =
        env_opt_u64(src, "EMBEDDING_TIMEOUT_SECS")?.unwrap_or(DEFAULT_EMBEDDING_TIMEOUT_SECS);

    Ok(LlmModelConfig {
        model,
        endpoint,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(timeout),
    })
}
