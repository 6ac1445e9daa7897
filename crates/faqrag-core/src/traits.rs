use crate::types::{Answer, ScoredChunk, SearchHit};

/// Turns a batch of strings into L2-normalized vectors of one fixed dimension.
pub trait Embedder: Send + Sync {
    /// Identifier of the provider/model pair, used in logs.
    fn model_id(&self) -> &str;
    fn embed_batch(&self, texts: &[String]) -> crate::Result<Vec<Vec<f32>>>;
}

/// Query side of the sparse (lexical) index.
pub trait TextSearcher: Send + Sync {
    fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>>;
    /// Number of indexed texts.
    fn len(&self) -> anyhow::Result<usize>;
}

/// Query side of the dense (vector) index.
pub trait VectorSearcher: Send + Sync {
    fn search_vec(&self, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>>;
    /// Number of stored vectors.
    fn len(&self) -> anyhow::Result<usize>;
}

/// External relevance judgment used by the reranker.
///
/// Must return one score per passage, in passage order. The caller treats any
/// error or a wrong-length answer as "no opinion".
pub trait RelevanceJudge: Send + Sync {
    fn judge(&self, question: &str, passages: &[String]) -> anyhow::Result<Vec<f32>>;
}

/// Produces the final answer. Implementations never fail; they degrade instead.
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, question: &str, chunks: &[ScoredChunk]) -> Answer;
}
