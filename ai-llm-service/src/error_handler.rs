//! Unified error handling for `ai-llm-service`.
//!
//! This module exposes a single top-level error type [`AiLlmError`] for the whole
//! library, and groups domain-specific errors in nested enums ([`ConfigError`],
//! [`OllamaError`], [`ModelArtifactError`]). Small helpers for reading/validating
//! environment variables are provided and return the unified [`Result<T>`] alias.
//!
//! All messages include the suffix `[AI LLM Service]` to simplify attribution in logs.

use std::collections::HashMap;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Errors returned by the Ollama client.
    #[error(transparent)]
    Ollama(#[from] OllamaError),

    /// The local model weights file failed verification.
    #[error(transparent)]
    ModelArtifact(#[from] ModelArtifactError),

    /// Underlying HTTP transport error while building a client.
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_MAX_TOKENS`, `OLLAMA_PORT`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `OLLAMA_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        /// Field name (e.g., `temperature`).
        field: &'static str,
        /// Description of the expected range.
        detail: &'static str,
    },
}

/* ------------------------------------------------------------------------- */
/* Ollama errors                                                             */
/* ------------------------------------------------------------------------- */

/// Errors produced by [`crate::services::ollama_service::OllamaService`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Invalid endpoint (empty or missing http/https).
    #[error("[AI LLM Service] invalid Ollama endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport/HTTP client error.
    #[error("[AI LLM Service] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from upstream.
    #[error("[AI LLM Service] unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Short snippet of the response body.
        snippet: String,
    },

    /// The server does not know the requested model.
    #[error("[AI LLM Service] model '{0}' is not available on the Ollama server")]
    ModelNotFound(String),

    /// Unexpected/invalid JSON response.
    #[error("[AI LLM Service] failed to decode response: {0}")]
    Decode(String),
}

impl OllamaError {
    /// `true` when the upstream answered `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OllamaError::HttpStatus { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/* ------------------------------------------------------------------------- */
/* Model artifact errors                                                     */
/* ------------------------------------------------------------------------- */

/// Verification failures for a local model weights file.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ModelArtifactError {
    /// Nothing exists at the configured path.
    #[error("[AI LLM Service] model file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path exists but is not a regular file.
    #[error("[AI LLM Service] model path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// The file header does not carry a supported magic.
    #[error("[AI LLM Service] incompatible model format in {}: {reason}", .path.display())]
    IncompatibleFormat {
        /// Offending file.
        path: PathBuf,
        /// What was found instead.
        reason: String,
    },

    /// Reading the file failed.
    #[error("[AI LLM Service] failed to read model file {}: {source}", .path.display())]
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Trims an upstream body down to a short, log-friendly snippet.
pub fn make_snippet(body: &str) -> String {
    body.chars().take(240).collect()
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Source of configuration variables.
///
/// [`ProcessEnv`] reads the process environment; a `HashMap<String, String>`
/// works as an in-memory source.
pub trait EnvSource {
    /// Returns the raw value of `name`, if set.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads from `std::env`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Returns a non-empty, trimmed variable or `None`.
pub fn env_opt(src: &dyn EnvSource, name: &str) -> Option<String> {
    src.var(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fetches a required, non-empty variable.
///
/// # Errors
/// Returns [`AiLlmError::Config`] with [`ConfigError::MissingVar`] if the
/// variable is absent or empty.
pub fn must_env(src: &dyn EnvSource, name: &'static str) -> Result<String> {
    env_opt(src, name).ok_or_else(|| ConfigError::MissingVar(name).into())
}

/// Parses an optional `u32` (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u32`.
pub fn env_opt_u32(src: &dyn EnvSource, name: &'static str) -> Result<Option<u32>> {
    match env_opt(src, name) {
        Some(v) => v.parse::<u32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        None => Ok(None),
    }
}

/// Parses an optional `u64` (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u64`.
pub fn env_opt_u64(src: &dyn EnvSource, name: &'static str) -> Result<Option<u64>> {
    match env_opt(src, name) {
        Some(v) => v.parse::<u64>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        None => Ok(None),
    }
}

/// Parses an optional `f32` (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid float.
pub fn env_opt_f32(src: &dyn EnvSource, name: &'static str) -> Result<Option<f32>> {
    match env_opt(src, name) {
        Some(v) => v.parse::<f32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected a floating point number",
            })
        }),
        None => Ok(None),
    }
}

/// Parses an optional boolean flag: `true/false`, `1/0`, `yes/no`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] for any other value.
pub fn env_opt_bool(src: &dyn EnvSource, name: &'static str) -> Result<Option<bool>> {
    match env_opt(src, name).map(|v| v.to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidFormat {
                var: name,
                reason: "expected true/false",
            }
            .into()),
        },
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers (return unified `Result<T>`)                           */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start with
/// a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]`.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn must_env_rejects_blank_values() {
        let env = src(&[("OLLAMA_MODEL", "   ")]);
        let err = must_env(&env, "OLLAMA_MODEL").unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::MissingVar("OLLAMA_MODEL"))
        ));
    }

    #[test]
    fn numbers_and_flags_parse() {
        let env = src(&[
            ("LLM_MAX_TOKENS", "512"),
            ("LLM_TEMPERATURE", "0.5"),
            ("ALLOW", "Yes"),
            ("BROKEN", "many"),
        ]);
        assert_eq!(env_opt_u32(&env, "LLM_MAX_TOKENS").unwrap(), Some(512));
        assert_eq!(env_opt_f32(&env, "LLM_TEMPERATURE").unwrap(), Some(0.5));
        assert_eq!(env_opt_bool(&env, "ALLOW").unwrap(), Some(true));
        assert_eq!(env_opt_u32(&env, "UNSET").unwrap(), None);
        assert!(env_opt_u32(&env, "BROKEN").is_err());
        assert!(env_opt_bool(&env, "BROKEN").is_err());
    }

    #[test]
    fn range_and_endpoint_validation() {
        assert!(validate_range_f32("temperature", 0.5, 0.0, 2.0).is_ok());
        assert!(validate_range_f32("temperature", f32::NAN, 0.0, 2.0).is_err());
        assert!(validate_range_f32("temperature", 2.5, 0.0, 2.0).is_err());
        assert!(validate_http_endpoint("OLLAMA_URL", "http://localhost:11434").is_ok());
        assert!(validate_http_endpoint("OLLAMA_URL", "localhost:11434").is_err());
    }

    #[test]
    fn not_found_detection() {
        let err = OllamaError::HttpStatus {
            status: StatusCode::NOT_FOUND,
            url: "http://x/api/show".into(),
            snippet: String::new(),
        };
        assert!(err.is_not_found());
        assert!(!OllamaError::Decode("x".into()).is_not_found());
    }
}
