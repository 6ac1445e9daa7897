//! Embedding clients for faqrag.
//!
//! [`embedder_from_config`] picks the provider named by the configuration.
//! Every implementation returns unit-length rows.

pub mod hash;
pub mod huggingface;
pub mod openai;
pub mod pool;

use std::time::Duration;

use tracing::info;

use faqrag_core::config::{AppConfig, EmbeddingProvider};
use faqrag_core::traits::Embedder;
use faqrag_core::{Error, Result};

pub use hash::HashEmbedder;
pub use huggingface::HuggingFaceEmbedder;
pub use openai::OpenAiEmbedder;
pub use pool::{l2_normalize, mean_pool};

/// Blocking HTTP client with the embedding timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Embedding(format!("building HTTP client: {e}")))
}

pub fn embedder_from_config(cfg: &AppConfig) -> Result<Box<dyn Embedder>> {
    let embedder: Box<dyn Embedder> = match cfg.embedding_provider {
        EmbeddingProvider::Hash => Box::new(HashEmbedder::new(cfg.hash_dim)),
        EmbeddingProvider::OpenAi => Box::new(OpenAiEmbedder::new(
            http_client(Duration::from_secs(cfg.embed_timeout_secs))?,
            cfg.openai_base_url.as_str(),
            cfg.openai_api_key.clone(),
            cfg.embed_model.as_str(),
        )?),
        EmbeddingProvider::HuggingFace => Box::new(HuggingFaceEmbedder::new(
            http_client(Duration::from_secs(cfg.embed_timeout_secs))?,
            cfg.huggingface_base_url.as_str(),
            cfg.hf_token.clone(),
            cfg.embed_model.as_str(),
        )?),
    };
    info!(model = embedder.model_id(), "embedder ready");
    Ok(embedder)
}
