//! In-process HNSW index rebuilt from a persisted directory.
//!
//! Layout:
//! ```text
//! <dir>/metadata.json  {"dimension":384,"metric":"cosine","count":1200,"embedding_model":"all-minilm"}
//! <dir>/chunks.json    [RagRecord, ...]
//! ```
//!
//! The stored embeddings are inserted into an `hnsw_rs` graph at load time;
//! nearest-neighbour search is delegated to it.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use hnsw_rs::hnsw::{Hnsw, Neighbour};
use hnsw_rs::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DistanceKind;
use crate::errors::RagError;
use crate::record::{RagHit, RagRecord};

/// Manifest file name inside the index directory.
pub const METADATA_FILE: &str = "metadata.json";
/// Chunks file name inside the index directory.
pub const CHUNKS_FILE: &str = "chunks.json";

const MAX_NB_CONNECTION: usize = 16;
const EF_CONSTRUCTION: usize = 200;
const MAX_LAYERS: usize = 16;

/// Contents of `metadata.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexMetadata {
    pub dimension: usize,
    #[serde(default = "default_metric")]
    pub metric: DistanceKind,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub embedding_model: Option<String>,
}

fn default_metric() -> DistanceKind {
    DistanceKind::Cosine
}

enum Graph {
    Cosine(Hnsw<'static, f32, DistCosine>),
    Euclid(Hnsw<'static, f32, DistL2>),
}

impl Graph {
    fn search(&self, query: &[f32], k: usize, ef: usize) -> Vec<Neighbour> {
        match self {
            Graph::Cosine(h) => h.search(query, k, ef),
            Graph::Euclid(h) => h.search(query, k, ef),
        }
    }

    /// Larger is more similar for both metrics.
    fn similarity(&self, distance: f32) -> f32 {
        match self {
            Graph::Cosine(_) => 1.0 - distance,
            Graph::Euclid(_) => -distance,
        }
    }
}

/// Immutable, fully validated index.
pub struct HnswIndex {
    metadata: IndexMetadata,
    /// Point id in the graph is the position in this vector.
    chunks: Vec<RagRecord>,
    graph: Option<Graph>,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("metadata", &self.metadata)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

impl HnswIndex {
    /// Loads the directory, validates it and builds the graph.
    ///
    /// Blocking; call from `spawn_blocking`.
    ///
    /// # Errors
    /// - [`RagError::NotFound`] for a missing directory or file
    /// - [`RagError::Parse`] for a corrupt manifest or chunks file
    /// - [`RagError::VectorSizeMismatch`] / [`RagError::SchemaMismatch`] when
    ///   chunks disagree with the manifest or with `expected_model`
    pub fn load(dir: &Path, expected_model: Option<&str>) -> Result<Self, RagError> {
        if !dir.is_dir() {
            return Err(RagError::NotFound(dir.to_path_buf()));
        }

        let metadata: IndexMetadata = read_json(&dir.join(METADATA_FILE))?;
        if let (Some(want), Some(have)) = (expected_model, metadata.embedding_model.as_deref()) {
            if want != have {
                return Err(RagError::SchemaMismatch(format!(
                    "index was built with embedding model `{have}`, configured `{want}`"
                )));
            }
        }

        let chunks: Vec<RagRecord> = read_json(&dir.join(CHUNKS_FILE))?;
        let index = Self::build(metadata, chunks)?;

        info!(
            dir = %dir.display(),
            chunks = index.chunks.len(),
            dimension = index.metadata.dimension,
            metric = ?index.metadata.metric,
            "hnsw index loaded"
        );
        Ok(index)
    }

    /// Validates `chunks` against `metadata` and inserts them into a new graph.
    ///
    /// # Errors
    /// Same schema errors as [`HnswIndex::load`].
    pub fn build(metadata: IndexMetadata, chunks: Vec<RagRecord>) -> Result<Self, RagError> {
        if metadata.dimension == 0 {
            return Err(RagError::SchemaMismatch("manifest dimension is 0".into()));
        }
        if let Some(count) = metadata.count {
            if count != chunks.len() {
                return Err(RagError::SchemaMismatch(format!(
                    "manifest declares {count} chunks, found {}",
                    chunks.len()
                )));
            }
        }
        for c in &chunks {
            if c.embedding.len() != metadata.dimension {
                debug!(id = %c.id, "chunk dimension differs from manifest");
                return Err(RagError::VectorSizeMismatch {
                    got: c.embedding.len(),
                    want: metadata.dimension,
                });
            }
            if c.embedding.iter().any(|v| !v.is_finite()) {
                return Err(RagError::SchemaMismatch(format!(
                    "chunk `{}` has a non-finite embedding value",
                    c.id
                )));
            }
        }

        let graph = if chunks.is_empty() {
            None
        } else {
            Some(match metadata.metric {
                DistanceKind::Cosine => Graph::Cosine(insert_all(&chunks, DistCosine)),
                DistanceKind::Euclid => Graph::Euclid(insert_all(&chunks, DistL2)),
            })
        };

        Ok(Self {
            metadata,
            chunks,
            graph,
        })
    }

    pub fn dimension(&self) -> usize {
        self.metadata.dimension
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top-k nearest chunks, most similar first.
    ///
    /// Cosine scores are `1 - distance`; Euclid scores are the negated distance.
    ///
    /// # Errors
    /// [`RagError::VectorSizeMismatch`] if `query` has the wrong length.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<RagHit>, RagError> {
        if query.len() != self.metadata.dimension {
            return Err(RagError::VectorSizeMismatch {
                got: query.len(),
                want: self.metadata.dimension,
            });
        }
        let Some(graph) = &self.graph else {
            return Ok(Vec::new());
        };
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let ef_search = (top_k * 2).max(50);
        Ok(graph
            .search(query, top_k, ef_search)
            .into_iter()
            .filter_map(|n| {
                self.chunks
                    .get(n.d_id)
                    .map(|c| RagHit::from_record(graph.similarity(n.distance), c))
            })
            .take(top_k)
            .collect())
    }
}

fn insert_all<D>(chunks: &[RagRecord], dist: D) -> Hnsw<'static, f32, D>
where
    D: Distance<f32> + Send + Sync,
{
    let mut hnsw = Hnsw::new(
        MAX_NB_CONNECTION,
        chunks.len(),
        MAX_LAYERS,
        EF_CONSTRUCTION,
        dist,
    );
    for (point_id, c) in chunks.iter().enumerate() {
        hnsw.insert((c.embedding.as_slice(), point_id));
    }
    hnsw.set_searching_mode(true);
    hnsw
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RagError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RagError::NotFound(PathBuf::from(path)),
        _ => RagError::Io(e),
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| RagError::Parse(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn rec(id: &str, v: Vec<f32>) -> RagRecord {
        RagRecord {
            id: id.into(),
            text: format!("text {id}"),
            source: Some("book.pdf".into()),
            page: None,
            embedding: v,
            extra: BTreeMap::new(),
        }
    }

    fn metadata(dimension: usize, metric: DistanceKind) -> IndexMetadata {
        IndexMetadata {
            dimension,
            metric,
            count: None,
            embedding_model: None,
        }
    }

    fn write_index(dir: &Path, metadata: &str, chunks: &str) {
        std::fs::write(dir.join(METADATA_FILE), metadata).unwrap();
        std::fs::write(dir.join(CHUNKS_FILE), chunks).unwrap();
    }

    #[test]
    fn cosine_ranks_by_similarity_and_truncates() {
        let idx = HnswIndex::build(
            metadata(2, DistanceKind::Cosine),
            vec![
                rec("far", vec![0.0, 1.0]),
                rec("near", vec![1.0, 0.1]),
                rec("mid", vec![1.0, 1.0]),
            ],
        )
        .unwrap();

        let hits = idx.search(&[1.0, 0.0], 2).unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["near", "mid"]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn euclid_prefers_closest_point() {
        let idx = HnswIndex::build(
            metadata(2, DistanceKind::Euclid),
            vec![rec("a", vec![5.0, 5.0]), rec("b", vec![0.5, 0.0])],
        )
        .unwrap();
        let hits = idx.search(&[0.0, 0.0], 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
        assert!((hits[0].score + 0.5).abs() < 1e-4);
    }

    #[test]
    fn fewer_chunks_than_k_and_wrong_query_size() {
        let idx = HnswIndex::build(
            metadata(2, DistanceKind::Cosine),
            vec![rec("only", vec![1.0, 0.0])],
        )
        .unwrap();
        assert_eq!(idx.search(&[1.0, 0.0], 2).unwrap().len(), 1);
        assert!(matches!(
            idx.search(&[1.0, 0.0, 0.0], 2),
            Err(RagError::VectorSizeMismatch { got: 3, want: 2 })
        ));
    }

    #[test]
    fn empty_index_returns_no_hits() {
        let idx = HnswIndex::build(metadata(2, DistanceKind::Cosine), Vec::new()).unwrap();
        assert!(idx.is_empty());
        assert!(idx.search(&[1.0, 0.0], 2).unwrap().is_empty());
    }

    #[test]
    fn rejects_chunks_that_disagree_with_manifest() {
        assert!(matches!(
            HnswIndex::build(
                metadata(3, DistanceKind::Cosine),
                vec![rec("a", vec![1.0, 0.0])]
            ),
            Err(RagError::VectorSizeMismatch { got: 2, want: 3 })
        ));

        let mut m = metadata(2, DistanceKind::Cosine);
        m.count = Some(5);
        assert!(matches!(
            HnswIndex::build(m, vec![rec("a", vec![1.0, 0.0])]),
            Err(RagError::SchemaMismatch(_))
        ));

        assert!(matches!(
            HnswIndex::build(
                metadata(2, DistanceKind::Cosine),
                vec![rec("nan", vec![f32::NAN, 0.0])]
            ),
            Err(RagError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn loads_directory_and_checks_embedding_model() {
        let dir = tempfile::tempdir().unwrap();
        write_index(
            dir.path(),
            r#"{"dimension":2,"metric":"euclid","count":1,"embedding_model":"all-minilm"}"#,
            r#"[{"id":"a","text":"Anemia is...","source":"gale.pdf","page":3,"embedding":[0.1,0.9]}]"#,
        );

        let idx = HnswIndex::load(dir.path(), Some("all-minilm")).unwrap();
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.metadata().metric, DistanceKind::Euclid);

        assert!(matches!(
            HnswIndex::load(dir.path(), Some("nomic-embed-text")),
            Err(RagError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn missing_or_corrupt_files_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            HnswIndex::load(&dir.path().join("nope"), None),
            Err(RagError::NotFound(_))
        ));
        assert!(matches!(
            HnswIndex::load(dir.path(), None),
            Err(RagError::NotFound(p)) if p.ends_with(METADATA_FILE)
        ));

        write_index(dir.path(), "{not json", "[]");
        assert!(matches!(
            HnswIndex::load(dir.path(), None),
            Err(RagError::Parse(_))
        ));

        write_index(
            dir.path(),
            r#"{"dimension":2}"#,
            r#"[{"id":"b","text":"no vector"}]"#,
        );
        assert!(matches!(
            HnswIndex::load(dir.path(), None),
            Err(RagError::Parse(msg)) if msg.contains(CHUNKS_FILE)
        ));
    }
}
