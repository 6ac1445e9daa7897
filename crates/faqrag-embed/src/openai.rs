use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use faqrag_core::config::Secret;
use faqrag_core::traits::Embedder;
use faqrag_core::{Error, Result};

use crate::pool::normalize_rows;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

/// `POST {base_url}/embeddings`, one request per batch.
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: Secret,
    model: String,
    model_id: String,
}

impl OpenAiEmbedder {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Secret, model: impl Into<String>) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::InvalidConfig("OpenAI API key is required for embeddings".into()));
        }
        let model = model.into();
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model_id: format!("openai/{model}"),
            model,
        })
    }
}

impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/embeddings", self.base_url);
        debug!(%url, texts = texts.len(), "requesting embeddings");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&EmbeddingRequest { input: texts, model: &self.model })
            .send()
            .map_err(|e| Error::Embedding(format!("OpenAI API error: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(Error::Embedding(format!("OpenAI API error: {status}: {body}")));
        }
        let mut parsed: EmbeddingResponse =
            resp.json().map_err(|e| Error::Embedding(format!("Invalid response from OpenAI API: {e}")))?;
        if parsed.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }
        parsed.data.sort_by_key(|row| row.index);
        normalize_rows(parsed.data.into_iter().map(|row| row.embedding).collect())
    }
}
