//! Domain types shared by the store, both index engines and the pipeline.

use serde::{Deserialize, Serialize};

/// Position of a chunk in the document store; also its row in the dense index.
pub type ChunkId = u64;

const UID_HEX_LEN: usize = 16;
const SNIPPET_CHARS: usize = 200;

/// Where a chunk came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub file_name: String,
    /// Sequence order within the source file.
    pub chunk_id: usize,
    #[serde(default)]
    pub page: Option<u32>,
}

/// A chunk produced by ingestion that has not been assigned a store position yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    pub text: String,
    pub meta: ChunkMeta,
}

impl RawChunk {
    pub fn new(text: impl Into<String>, file_name: impl Into<String>, chunk_id: usize) -> Self {
        Self {
            text: text.into(),
            meta: ChunkMeta { file_name: file_name.into(), chunk_id, page: None },
        }
    }

    /// Content-derived identity used to skip chunks that were already indexed.
    pub fn uid(&self) -> String {
        chunk_uid(&self.text, &self.meta.file_name, self.meta.chunk_id)
    }
}

/// Short BLAKE3 digest over `(text, file_name, chunk_id)`.
pub fn chunk_uid(text: &str, file_name: &str, chunk_id: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(text.as_bytes());
    hasher.update(&[0]);
    hasher.update(file_name.as_bytes());
    hasher.update(&[0]);
    hasher.update(chunk_id.to_string().as_bytes());
    let mut hex = hasher.finalize().to_hex().to_string();
    hex.truncate(UID_HEX_LEN);
    hex
}

/// A chunk as persisted in the document store.
///
/// - `id`: store position, assigned once and never reused
/// - `uid`: content digest (see [`chunk_uid`])
/// - `text`: the retrievable content
/// - `meta`: source file, sequence number and optional page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub uid: String,
    pub text: String,
    pub meta: ChunkMeta,
}

impl Chunk {
    /// Key used by fusion to recognise the same chunk in both result lists.
    pub fn fusion_key(&self) -> (&str, usize) {
        (self.meta.file_name.as_str(), self.meta.chunk_id)
    }
}

/// Indicates which engine produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Dense,
    Sparse,
}

/// The minimal surface returned by both engines.
///
/// `id` matches `Chunk::id`. `score` is engine-specific but higher is always
/// better. `source` labels the origin engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: ChunkId,
    pub score: f32,
    pub source: SourceKind,
}

/// A chunk decorated with a score that is only meaningful within one retrieval call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

impl ScoredChunk {
    pub fn new(chunk: Chunk, score: f32) -> Self {
        Self { chunk, score }
    }

    pub fn file_name(&self) -> &str {
        &self.chunk.meta.file_name
    }

    pub fn text(&self) -> &str {
        &self.chunk.text
    }
}

/// Read-only projection of a chunk used for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub file: String,
    pub page: Option<u32>,
    pub snippet: String,
}

impl From<&Chunk> for Citation {
    fn from(chunk: &Chunk) -> Self {
        let snippet: String = chunk.text.chars().take(SNIPPET_CHARS).collect();
        Self {
            file: chunk.meta.file_name.clone(),
            page: chunk.meta.page,
            snippet: snippet.replace('\n', " "),
        }
    }
}

impl Citation {
    pub fn from_chunks(chunks: &[ScoredChunk]) -> Vec<Citation> {
        chunks.iter().map(|c| Citation::from(&c.chunk)).collect()
    }
}

/// Final product of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_is_stable_and_short() {
        let chunk = RawChunk::new("Q: refund?\nA: 30 days", "faq.csv", 0);
        let uid = chunk.uid();
        assert_eq!(uid.len(), 16);
        assert_eq!(uid, chunk_uid("Q: refund?\nA: 30 days", "faq.csv", 0));
        assert!(uid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn uid_matches_recorded_value() {
        // Stored docstores depend on this digest; changing it re-indexes everything.
        assert_eq!(chunk_uid("Q: refund?\nA: 30 days", "faq.csv", 0), "ad508125c58bd24f");
    }

    #[test]
    fn uid_depends_on_every_field() {
        let base = chunk_uid("text", "a.txt", 0);
        assert_ne!(base, chunk_uid("text", "a.txt", 1));
        assert_ne!(base, chunk_uid("text", "b.txt", 0));
        assert_ne!(base, chunk_uid("other", "a.txt", 0));
        // Field boundaries are not ambiguous.
        assert_ne!(chunk_uid("ab", "c", 0), chunk_uid("a", "bc", 0));
    }

    #[test]
    fn citation_snippet_is_flattened_and_capped() {
        let chunk = Chunk {
            id: 0,
            uid: "x".into(),
            text: format!("line one\nline two {}", "z".repeat(400)),
            meta: ChunkMeta { file_name: "faq.md".into(), chunk_id: 3, page: Some(2) },
        };
        let citation = Citation::from(&chunk);
        assert_eq!(citation.file, "faq.md");
        assert_eq!(citation.page, Some(2));
        assert_eq!(citation.snippet.chars().count(), 200);
        assert!(citation.snippet.starts_with("line one line two"));
    }
}
