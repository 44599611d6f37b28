//! Index location and loading configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::RagError;

/// Distance function used for the local HNSW graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceKind {
    /// Cosine distance (`hnsw_rs::DistCosine`).
    Cosine,
    /// Euclidean distance (`hnsw_rs::DistL2`); scored as the negated distance.
    Euclid,
}

/// Qdrant connection settings.
#[derive(Clone, Debug)]
pub struct QdrantConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub url: String,
    /// Optional API key for Qdrant Cloud.
    pub api_key: Option<String>,
    /// Existing collection holding the document chunks.
    pub collection: String,
}

/// Where the persisted index lives.
#[derive(Clone, Debug)]
pub enum IndexBackend {
    /// Directory with `metadata.json` + `chunks.json`, searched with an in-process HNSW graph.
    Local { path: PathBuf },
    /// Pre-populated Qdrant collection.
    Qdrant(QdrantConfig),
}

/// Configuration for opening the index.
#[derive(Clone, Debug)]
pub struct IndexConfig {
    pub backend: IndexBackend,
    /// Loading a persisted index is refused unless this is set.
    pub allow_deserialization: bool,
    /// Embedding model the caller will query with; checked against the
    /// manifest when the manifest records one.
    pub embedding_model: Option<String>,
}

impl IndexConfig {
    /// Local index at `path`, deserialization allowed.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: IndexBackend::Local { path: path.into() },
            allow_deserialization: true,
            embedding_model: None,
        }
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        match &self.backend {
            IndexBackend::Local { path } => {
                if path.as_os_str().is_empty() {
                    return Err(RagError::Config("index path is empty".into()));
                }
            }
            IndexBackend::Qdrant(q) => {
                if q.url.trim().is_empty() {
                    return Err(RagError::Config("qdrant url is empty".into()));
                }
                if q.collection.trim().is_empty() {
                    return Err(RagError::Config("collection is empty".into()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_names_are_lowercase() {
        let d: DistanceKind = serde_json::from_str("\"euclid\"").unwrap();
        assert_eq!(d, DistanceKind::Euclid);
        assert!(serde_json::from_str::<DistanceKind>("\"manhattan\"").is_err());
        assert!(serde_json::from_str::<DistanceKind>("\"dot\"").is_err());
    }

    #[test]
    fn rejects_blank_collection() {
        let cfg = IndexConfig {
            backend: IndexBackend::Qdrant(QdrantConfig {
                url: "http://localhost:6334".into(),
                api_key: None,
                collection: "  ".into(),
            }),
            allow_deserialization: true,
            embedding_model: None,
        };
        assert!(matches!(cfg.validate(), Err(RagError::Config(_))));
        assert!(IndexConfig::local("vectorstore").validate().is_ok());
    }
}
