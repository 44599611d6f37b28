//! Runtime configuration loaded from environment variables.
//!
//! | var | default |
//! |---|---|
//! | `VECTOR_INDEX_BACKEND` | `local` (`local` or `qdrant`) |
//! | `VECTOR_INDEX_PATH` | `vectorstore` |
//! | `ALLOW_INDEX_DESERIALIZATION` | `true` |
//! | `QDRANT_URL` | `http://127.0.0.1:6334` |
//! | `QDRANT_COLLECTION` | `documents` |
//! | `QDRANT_API_KEY` | unset |
//! | `EMBEDDING_MODEL` | required by the embedding profile; compared with the index metadata when it names a model |
//! | `RAG_TOP_K` | `2` |
//! | `LLM_MODEL_PATH` | unset (file check skipped) |

use std::path::PathBuf;

use ai_llm_service::error_handler::{
    AiLlmError, ConfigError, EnvSource, env_opt, env_opt_bool, env_opt_u64,
};
use rag_store::{IndexBackend, IndexConfig, QdrantConfig};

/// Number of fragments retrieved per question.
pub const DEFAULT_TOP_K: u64 = 2;
pub const DEFAULT_INDEX_PATH: &str = "vectorstore";
pub const DEFAULT_QDRANT_URL: &str = "http://127.0.0.1:6334";
pub const DEFAULT_QDRANT_COLLECTION: &str = "documents";

/// Config bag for the pipeline.
#[derive(Clone, Debug)]
pub struct QaConfig {
    pub index: IndexConfig,
    pub top_k: u64,
    /// Local weights to verify before asking the runtime to load the model.
    pub model_path: Option<PathBuf>,
}

impl QaConfig {
    /// Build from environment variables with the defaults above.
    ///
    /// # Errors
    /// [`AiLlmError::Config`] for unparsable values, an unknown backend or `RAG_TOP_K=0`.
    pub fn from_env(src: &dyn EnvSource) -> Result<Self, AiLlmError> {
        let backend = match env_opt(src, "VECTOR_INDEX_BACKEND")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("local") => IndexBackend::Local {
                path: env_opt(src, "VECTOR_INDEX_PATH")
                    .unwrap_or_else(|| DEFAULT_INDEX_PATH.to_string())
                    .into(),
            },
            Some("qdrant") => IndexBackend::Qdrant(QdrantConfig {
                url: env_opt(src, "QDRANT_URL").unwrap_or_else(|| DEFAULT_QDRANT_URL.to_string()),
                api_key: env_opt(src, "QDRANT_API_KEY"),
                collection: env_opt(src, "QDRANT_COLLECTION")
                    .unwrap_or_else(|| DEFAULT_QDRANT_COLLECTION.to_string()),
            }),
            Some(_) => {
                return Err(ConfigError::InvalidFormat {
                    var: "VECTOR_INDEX_BACKEND",
                    reason: "expected `local` or `qdrant`",
                }
                .into());
            }
        };

        let top_k = env_opt_u64(src, "RAG_TOP_K")?.unwrap_or(DEFAULT_TOP_K);
        if top_k == 0 {
            return Err(ConfigError::OutOfRange {
                field: "RAG_TOP_K",
                detail: "must be at least 1",
            }
            .into());
        }

        Ok(Self {
            index: IndexConfig {
                backend,
                allow_deserialization: env_opt_bool(src, "ALLOW_INDEX_DESERIALIZATION")?
                    .unwrap_or(true),
                embedding_model: env_opt(src, "EMBEDDING_MODEL"),
            },
            top_k,
            model_path: env_opt(src, "LLM_MODEL_PATH").map(PathBuf::from),
        })
    }
}
