//! Hybrid retrieval for faqrag: index maintenance, dense + sparse retrieval,
//! score fusion, optional reranking and the staged query pipeline.

pub mod fusion;
pub mod indexer;
pub mod pipeline;
pub mod rerank;
pub mod retriever;

pub use fusion::merge_candidates;
pub use indexer::{Indexer, UpdateReport};
pub use pipeline::{Pipeline, PipelineOutput, PipelineShape, QueryOptions, Stage};
pub use rerank::Reranker;
pub use retriever::{HybridRetriever, IndexPaths};
