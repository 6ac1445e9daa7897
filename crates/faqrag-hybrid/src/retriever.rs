use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use tracing::debug;

use faqrag_core::config::AppConfig;
use faqrag_core::store::DocumentStore;
use faqrag_core::traits::{Embedder, TextSearcher, VectorSearcher};
use faqrag_core::types::{ScoredChunk, SearchHit};
use faqrag_text::SparseSearcher;
use faqrag_vector::LanceDenseIndex;

/// Locations of every persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub dense: PathBuf,
    pub docstore: PathBuf,
    pub sparse: PathBuf,
    pub build_lock: PathBuf,
}

impl IndexPaths {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            dense: cfg.dense_path.clone(),
            docstore: cfg.docstore_path.clone(),
            sparse: cfg.sparse_path.clone(),
            build_lock: cfg.build_lock_path.clone(),
        }
    }

    /// All artifacts under one directory, named like the defaults.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            dense: root.join("dense"),
            docstore: root.join("docstore.json"),
            sparse: root.join("sparse"),
            build_lock: root.join("build.lock"),
        }
    }
}

/// Runs both index engines against one store snapshot and joins hits to chunks.
pub struct HybridRetriever<TI, VI>
where
    TI: TextSearcher,
    VI: VectorSearcher,
{
    text: TI,
    vector: VI,
    embedder: Box<dyn Embedder>,
    store: DocumentStore,
}

impl HybridRetriever<SparseSearcher, LanceDenseIndex> {
    /// Load the store first, then open the indices; hits past the store are ignored.
    pub fn open(paths: &IndexPaths, embedder: Box<dyn Embedder>) -> Result<Self> {
        let store = DocumentStore::load(&paths.docstore).context("loading document store")?;
        let text = SparseSearcher::open(&paths.sparse).context("opening sparse index")?;
        let vector = LanceDenseIndex::open(&paths.dense).context("opening dense index")?;
        Ok(Self::new(text, vector, embedder, store))
    }
}

impl<TI, VI> HybridRetriever<TI, VI>
where
    TI: TextSearcher,
    VI: VectorSearcher,
{
    pub fn new(text: TI, vector: VI, embedder: Box<dyn Embedder>, store: DocumentStore) -> Self {
        Self { text, vector, embedder, store }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn text(&self) -> &TI {
        &self.text
    }

    pub fn vector(&self) -> &VI {
        &self.vector
    }

    /// Top `k` chunks by inner product with the query embedding.
    pub fn retrieve_dense(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 || self.store.is_empty() || self.vector.len()? == 0 {
            return Ok(Vec::new());
        }
        let q_vec = self
            .embedder
            .embed_batch(&[question.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("embedder returned no vector for the query"))?;
        let hits = self.vector.search_vec(&q_vec, k)?;
        Ok(self.join(hits))
    }

    /// Top `k` chunks by BM25.
    pub fn retrieve_sparse(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 || self.store.is_empty() {
            return Ok(Vec::new());
        }
        let hits = self.text.search(question, k)?;
        Ok(self.join(hits))
    }

    /// Dense list, plus the sparse list when `use_hybrid`.
    pub fn retrieve(
        &self,
        question: &str,
        topk_vec: usize,
        topk_sparse: usize,
        use_hybrid: bool,
    ) -> Result<(Vec<ScoredChunk>, Vec<ScoredChunk>)> {
        let dense = self.retrieve_dense(question, topk_vec)?;
        let sparse = if use_hybrid { self.retrieve_sparse(question, topk_sparse)? } else { Vec::new() };
        Ok((dense, sparse))
    }

    fn join(&self, hits: Vec<SearchHit>) -> Vec<ScoredChunk> {
        let total = hits.len();
        let joined: Vec<ScoredChunk> = hits
            .into_iter()
            .filter_map(|h| self.store.get(h.id).map(|chunk| ScoredChunk::new(chunk.clone(), h.score)))
            .collect();
        if joined.len() < total {
            debug!(dropped = total - joined.len(), "ignored hits outside the store snapshot");
        }
        joined
    }
}
