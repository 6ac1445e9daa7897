//! Document Store: the ordered, persisted list of chunks.
//!
//! The store owns chunk identity: a chunk's `id` is its position here and its row
//! in the dense index. Writes go to a temp file in the same directory and are
//! renamed into place, so readers only ever see a complete snapshot.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkId, RawChunk};

#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    chunks: Vec<Chunk>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no document store yet");
            return Ok(Self::default());
        }
        let bytes = fs::read(path)?;
        let chunks: Vec<Chunk> = serde_json::from_slice(&bytes)?;
        for (pos, chunk) in chunks.iter().enumerate() {
            if chunk.id != pos as ChunkId {
                return Err(Error::Storage(format!(
                    "{}: record at position {pos} has id {}",
                    path.display(),
                    chunk.id
                )));
            }
        }
        Ok(Self { chunks })
    }

    /// Atomically replace the file at `path` with this store.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = parent_dir(path);
        fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer(&mut tmp, &self.chunks)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Storage(format!("persist {}: {}", path.display(), e.error)))?;
        debug!(path = %path.display(), chunks = self.chunks.len(), "document store saved");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        usize::try_from(id).ok().and_then(|i| self.chunks.get(i))
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn texts(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.text.clone()).collect()
    }

    /// Split incoming chunks into those not yet stored and the number of duplicates.
    /// Duplicates inside `incoming` count as well; the first occurrence wins.
    pub fn partition_new(&self, incoming: Vec<RawChunk>) -> (Vec<RawChunk>, usize) {
        let mut seen: HashSet<String> = self.chunks.iter().map(|c| c.uid.clone()).collect();
        let total = incoming.len();
        let fresh: Vec<RawChunk> = incoming.into_iter().filter(|c| seen.insert(c.uid())).collect();
        let duplicates = total - fresh.len();
        (fresh, duplicates)
    }

    /// Append chunks with the next ids. Returns the id of the first appended chunk.
    pub fn extend(&mut self, fresh: Vec<RawChunk>) -> ChunkId {
        let first = self.chunks.len() as ChunkId;
        for raw in fresh {
            let id = self.chunks.len() as ChunkId;
            let uid = raw.uid();
            self.chunks.push(Chunk { id, uid, text: raw.text, meta: raw.meta });
        }
        first
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
