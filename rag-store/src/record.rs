//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One stored chunk: text, provenance and its embedding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RagRecord {
    pub id: String,
    pub text: String,
    pub source: Option<String>,
    pub page: Option<u32>,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

/// Query parameters for RAG retrieval.
#[derive(Clone, Copy, Debug)]
pub struct RagQuery<'a> {
    pub text: &'a str,
    pub top_k: u64,
}

/// A single retrieval hit with score, text and provenance.
#[derive(Clone, Debug)]
pub struct RagHit {
    pub score: f32,
    pub id: String,
    pub text: String,
    pub source: Option<String>,
    pub page: Option<u32>,
    pub payload: Value,
}

impl RagHit {
    /// Builds a hit from a stored record.
    pub(crate) fn from_record(score: f32, r: &RagRecord) -> Self {
        Self {
            score,
            id: r.id.clone(),
            text: r.text.clone(),
            source: r.source.clone(),
            page: r.page,
            payload: Value::Object(r.extra.clone().into_iter().collect()),
        }
    }
}
