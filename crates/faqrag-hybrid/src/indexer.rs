//! Build-time maintenance of the store and both indices.
//!
//! The store file is the commit point: vectors and the sparse index are
//! written first, the store last. A crashed or failed build is repaired by the
//! next one (dense rows past the store are dropped, store rows missing from the
//! dense index are re-embedded, the sparse index is rebuilt).

use anyhow::{bail, Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::{debug, info, warn};

use faqrag_core::store::DocumentStore;
use faqrag_core::traits::Embedder;
use faqrag_core::types::RawChunk;
use faqrag_text::SparseIndexer;
use faqrag_vector::LanceDenseIndex;

use crate::retriever::IndexPaths;

/// Outcome of one `update_indices` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Chunks passed in.
    pub received: usize,
    /// Chunks skipped because their uid was already stored (or repeated in the batch).
    pub duplicates: usize,
    /// Chunks appended to the store.
    pub added: usize,
    /// Texts sent to the embedder, including re-embedded store rows.
    pub embedded: usize,
    /// Store length after the build.
    pub total: usize,
}

pub struct Indexer {
    paths: IndexPaths,
    embedder: Box<dyn Embedder>,
}

impl Indexer {
    pub fn new(paths: IndexPaths, embedder: Box<dyn Embedder>) -> Self {
        Self { paths, embedder }
    }

    /// Add the chunks not seen before. Repeating a call with the same input adds nothing.
    pub fn update_indices(&self, new_chunks: Vec<RawChunk>) -> Result<UpdateReport> {
        let lock_file = open_lock_file(&self.paths.build_lock)?;
        let mut lock = fd_lock::RwLock::new(lock_file);
        debug!(path = %self.paths.build_lock.display(), "waiting for build lock");
        let _guard = lock.write().context("acquiring build lock")?;

        let received = new_chunks.len();
        let mut store = DocumentStore::load(&self.paths.docstore).context("loading document store")?;
        let dense = LanceDenseIndex::open(&self.paths.dense).context("opening dense index")?;

        let dense_len = dense.len()?;
        if dense_len > store.len() {
            dense.truncate_to(store.len())?;
        }
        let tail_start = dense_len.min(store.len());
        if tail_start < store.len() {
            warn!(missing = store.len() - tail_start, "store rows missing from dense index; re-embedding");
        }

        let (fresh, duplicates) = store.partition_new(new_chunks);
        let added = fresh.len();

        let texts: Vec<String> = store.chunks()[tail_start..]
            .iter()
            .map(|c| c.text.clone())
            .chain(fresh.iter().map(|c| c.text.clone()))
            .collect();
        let embedded = texts.len();

        if !texts.is_empty() {
            info!(texts = embedded, model = self.embedder.model_id(), "embedding chunks");
            let vectors = self.embedder.embed_batch(&texts).context("embedding chunks")?;
            validate_vectors(&vectors, embedded, dense.dim()?)?;
            store.extend(fresh);
            dense.append(tail_start as u64, &vectors).context("appending to dense index")?;
        }

        SparseIndexer::new(&self.paths.sparse).rebuild(store.chunks()).context("rebuilding sparse index")?;
        store.save(&self.paths.docstore).context("saving document store")?;

        let report = UpdateReport { received, duplicates, added, embedded, total: store.len() };
        info!(
            received = report.received,
            duplicates = report.duplicates,
            added = report.added,
            embedded = report.embedded,
            total = report.total,
            "indices updated"
        );
        Ok(report)
    }
}

fn open_lock_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("opening build lock {}", path.display()))
}

fn validate_vectors(vectors: &[Vec<f32>], expected: usize, index_dim: Option<usize>) -> Result<()> {
    if vectors.len() != expected {
        bail!("embedder returned {} vectors for {} texts", vectors.len(), expected);
    }
    let dim = vectors.first().map(Vec::len).unwrap_or_default();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        bail!("inconsistent embedding dimensions: {} vs {}", dim, bad.len());
    }
    if let Some(index_dim) = index_dim {
        if index_dim != dim {
            bail!("embedding dimension {dim} does not match dense index dimension {index_dim}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_validation() {
        assert!(validate_vectors(&[vec![1.0, 0.0]], 1, Some(2)).is_ok());
        assert!(validate_vectors(&[vec![1.0, 0.0]], 2, None).is_err());
        assert!(validate_vectors(&[vec![1.0, 0.0], vec![1.0]], 2, None).is_err());
        assert!(validate_vectors(&[vec![1.0, 0.0]], 1, Some(3)).is_err());
    }
}
