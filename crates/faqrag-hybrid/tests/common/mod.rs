#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use faqrag_core::store::DocumentStore;
use faqrag_core::traits::{Embedder, TextSearcher, VectorSearcher};
use faqrag_core::types::{RawChunk, SearchHit, SourceKind};
use faqrag_core::{Error, Result};

/// Returns preset hits regardless of the query.
pub struct CannedText(pub Vec<(u64, f32)>);

impl TextSearcher for CannedText {
    fn search(&self, _query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>> {
        Ok(self.0.iter().take(k).map(|&(id, score)| SearchHit { id, score, source: SourceKind::Sparse }).collect())
    }

    fn len(&self) -> anyhow::Result<usize> {
        Ok(self.0.len())
    }
}

pub struct CannedVector(pub Vec<(u64, f32)>);

impl VectorSearcher for CannedVector {
    fn search_vec(&self, _query_vec: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>> {
        Ok(self.0.iter().take(k).map(|&(id, score)| SearchHit { id, score, source: SourceKind::Dense }).collect())
    }

    fn len(&self) -> anyhow::Result<usize> {
        Ok(self.0.len())
    }
}

/// Constant embedder that counts calls and can be told to fail.
#[derive(Clone, Default)]
pub struct CountingEmbedder {
    pub calls: Arc<AtomicUsize>,
    pub texts: Arc<AtomicUsize>,
    pub fail: bool,
}

impl CountingEmbedder {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

impl Embedder for CountingEmbedder {
    fn model_id(&self) -> &str {
        "counting"
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        if self.fail {
            return Err(Error::Embedding("provider unavailable".into()));
        }
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }
}

pub fn store_with(texts: &[(&str, &str)]) -> DocumentStore {
    let mut store = DocumentStore::new();
    store.extend(texts.iter().enumerate().map(|(i, (file, text))| RawChunk::new(*text, *file, i)).collect());
    store
}

pub fn raw_chunks(file: &str, texts: &[&str]) -> Vec<RawChunk> {
    texts.iter().enumerate().map(|(i, t)| RawChunk::new(*t, file, i)).collect()
}
