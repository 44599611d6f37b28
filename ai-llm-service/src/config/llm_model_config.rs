/// Configuration for one Ollama model profile.
///
/// Sampling parameters are fixed here once and reused for every call made
/// through the profile; callers never vary them per request.
///
/// # Fields
///
/// - `model`: Ollama model tag (e.g., `"llama2:7b-chat-q8_0"`, `"all-minilm"`).
/// - `endpoint`: Base URL of the Ollama server.
/// - `max_tokens`: Maximum number of new tokens to generate (`num_predict`).
/// - `temperature`: Controls randomness (0.0 = deterministic, >1.0 = more random).
/// - `top_p`: Nucleus sampling cutoff (alternative to temperature).
/// - `timeout_secs`: Optional request timeout. `None` means no client-side timeout.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_model_config::LlmModelConfig;
///
/// let cfg = LlmModelConfig {
///     model: "llama2:7b-chat-q8_0".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     max_tokens: Some(512),
///     temperature: Some(0.5),
///     top_p: None,
///     timeout_secs: None,
/// };
/// assert_eq!(cfg.max_tokens, Some(512));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// Model identifier string.
    pub model: String,

    /// Inference endpoint (local URL of the Ollama server).
    pub endpoint: String,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
