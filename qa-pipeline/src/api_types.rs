//! Public API types re-used by external crates (e.g., the chat session layer).

use rag_store::RagHit;

/// A retrieved chunk of source material together with its provenance.
///
/// # Example
/// ```
/// use qa_pipeline::DocumentFragment;
/// let f = DocumentFragment {
///     text: "Hypertension is...".into(),
///     source: "data/gale.pdf".into(),
///     page: Some(211),
///     score: 0.83,
/// };
/// assert_eq!(f.identity(), "data/gale.pdf (page 211)");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentFragment {
    pub text: String,
    pub source: String,
    pub page: Option<u32>,
    pub score: f32,
}

impl DocumentFragment {
    /// Human-readable provenance: `source` or `source (page N)`.
    pub fn identity(&self) -> String {
        match self.page {
            Some(p) => format!("{} (page {p})", self.source),
            None => self.source.clone(),
        }
    }
}

impl From<RagHit> for DocumentFragment {
    /// Hits without a `source` fall back to the record id.
    fn from(h: RagHit) -> Self {
        Self {
            text: h.text,
            source: h.source.unwrap_or(h.id),
            page: h.page,
            score: h.score,
        }
    }
}

/// Final answer together with the fragments the model was shown.
#[derive(Clone, Debug)]
pub struct AnswerResult {
    /// Generated answer, never empty.
    pub text: String,
    /// Retrieved fragments, most similar first; at most `k`.
    pub sources: Vec<DocumentFragment>,
}
