//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! The collection is expected to be populated elsewhere; this facade only
//! verifies it and runs similarity searches against it.

use std::collections::HashMap;

use crate::config::QdrantConfig;
use crate::errors::RagError;
use crate::record::RagHit;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{SearchPointsBuilder, Value as QValue, vectors_config};
use tracing::{debug, info};

/// A facade over the Qdrant client bound to one existing collection.
pub struct QdrantFacade {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl std::fmt::Debug for QdrantFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantFacade")
            .field("collection", &self.collection)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl QdrantFacade {
    /// Connects and checks that the collection exists with a single unnamed
    /// vector space.
    ///
    /// # Errors
    /// - [`RagError::Qdrant`] if the client cannot be built or a call fails
    /// - [`RagError::NotFound`] / [`RagError::SchemaMismatch`] if the collection
    ///   is missing or uses named vectors
    pub async fn open(cfg: &QdrantConfig) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&cfg.url);
        if let Some(key) = &cfg.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        let exists = client
            .collection_exists(cfg.collection.as_str())
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;
        if !exists {
            return Err(RagError::NotFound(cfg.collection.clone().into()));
        }

        let info = client
            .collection_info(cfg.collection.as_str())
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        let params = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);

        let dimension = match params {
            Some(vectors_config::Config::Params(p)) => p.size as usize,
            Some(vectors_config::Config::ParamsMap(_)) => {
                return Err(RagError::SchemaMismatch(format!(
                    "collection '{}' uses named vectors",
                    cfg.collection
                )));
            }
            None => {
                return Err(RagError::SchemaMismatch(format!(
                    "collection '{}' reports no vector params",
                    cfg.collection
                )));
            }
        };

        info!(collection = %cfg.collection, dimension, "qdrant collection opened");
        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            dimension,
        })
    }

    /// Vector size configured on the collection.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Performs a similarity search and maps payloads to hits.
    ///
    /// Payload keys `text`, `source` and `page` are lifted onto the hit;
    /// LangChain-style `page_content` / `metadata.*` payloads are recognised too.
    pub async fn search(&self, vector: Vec<f32>, top_k: u64) -> Result<Vec<RagHit>, RagError> {
        debug!("Searching in '{}' with top_k={}", self.collection, top_k);

        let res = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true),
            )
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        let mut out = Vec::with_capacity(res.result.len());
        for r in res.result.into_iter() {
            let id = r
                .id
                .and_then(|p| p.point_id_options)
                .map(|o| match o {
                    qdrant_client::qdrant::point_id::PointIdOptions::Num(n) => n.to_string(),
                    qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u) => u,
                })
                .unwrap_or_default();
            out.push(hit_from_payload(r.score, id, qpayload_to_json(r.payload)));
        }

        debug!("Search completed: {} hits returned", out.len());
        Ok(out)
    }
}

/// Lifts the well-known fields out of a JSON payload.
pub(crate) fn hit_from_payload(score: f32, id: String, payload: serde_json::Value) -> RagHit {
    let meta = payload.get("metadata");
    let field = |k: &str| {
        payload
            .get(k)
            .or_else(|| meta.and_then(|m| m.get(k)))
            .filter(|v| !v.is_null())
    };

    let text = field("text")
        .or_else(|| field("page_content"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let source = field("source").and_then(|v| v.as_str()).map(str::to_string);
    let page = field("page")
        .and_then(|v| v.as_u64())
        .and_then(|n| u32::try_from(n).ok());

    RagHit {
        score,
        id,
        text,
        source,
        page,
        payload,
    }
}

/// Converts a Qdrant payload (`HashMap<String, qdrant::Value>`) into JSON.
fn qpayload_to_json(p: HashMap<String, QValue>) -> serde_json::Value {
    serde_json::Value::Object(p.into_iter().map(|(k, v)| (k, qvalue_to_json(v))).collect())
}

fn qvalue_to_json(v: QValue) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind as K;
    match v.kind {
        Some(K::StringValue(s)) => serde_json::Value::String(s),
        Some(K::IntegerValue(i)) => serde_json::Value::Number(i.into()),
        Some(K::DoubleValue(f)) => serde_json::json!(f),
        Some(K::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(K::StructValue(s)) => qpayload_to_json(s.fields),
        Some(K::ListValue(l)) => {
            serde_json::Value::Array(l.values.into_iter().map(qvalue_to_json).collect())
        }
        Some(K::NullValue(_)) | None => serde_json::Value::Null,
    }
}
