//! Unified error types for the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for rag-store operations.
///
/// Every variant raised while opening an index means the index is unusable;
/// callers surface those as "index unavailable".
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors (manifest or record rows).
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Index directory or one of its files does not exist.
    #[error("index path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Loading a persisted index was not permitted by configuration.
    #[error("loading the persisted index is disabled (ALLOW_INDEX_DESERIALIZATION=false)")]
    DeserializationDisabled,

    /// Mismatch in vector dimensionality (records, query vector or embedder).
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Index content disagrees with its manifest or with the runtime config.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Embedding provider failure.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),

    /// A blocking search/load task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
