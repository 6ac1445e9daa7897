use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use faqrag_core::config::Secret;
use faqrag_core::traits::Embedder;
use faqrag_core::{Error, Result};

use crate::pool::{mean_pool, normalize_rows};

pub const HF_BATCH_SIZE: usize = 10;

/// HuggingFace inference API feature extraction, batched.
pub struct HuggingFaceEmbedder {
    client: Client,
    base_url: String,
    token: Secret,
    model: String,
    model_id: String,
}

impl HuggingFaceEmbedder {
    pub fn new(client: Client, base_url: impl Into<String>, token: Secret, model: impl Into<String>) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::InvalidConfig("HuggingFace token is required for embeddings".into()));
        }
        let model = model.into();
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            model_id: format!("huggingface/{model}"),
            model,
        })
    }

    fn embed_chunk(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/models/{}", self.base_url, self.model);
        debug!(%url, texts = batch.len(), "requesting embeddings");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.token.expose())
            .json(&json!({ "inputs": batch, "options": { "wait_for_model": true } }))
            .send()
            .map_err(|e| Error::Embedding(format!("HuggingFace API error: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(Error::Embedding(format!("HuggingFace API error: {status} - Response: {body}")));
        }
        let value: Value =
            resp.json().map_err(|e| Error::Embedding(format!("Invalid response from HuggingFace API: {e}")))?;
        rows_from_response(&value, batch.len())
    }
}

impl Embedder for HuggingFaceEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut rows = Vec::with_capacity(texts.len());
        for batch in texts.chunks(HF_BATCH_SIZE) {
            rows.extend(self.embed_chunk(batch)?);
        }
        normalize_rows(rows)
    }
}

/// Accept a single vector, one vector per input, or per-token vectors per input.
fn rows_from_response(value: &Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let unexpected = || Error::Embedding(format!("Unexpected response format for {expected} inputs"));
    let rows = match depth(value) {
        1 if expected == 1 => vec![as_vector(value).ok_or_else(unexpected)?],
        2 => {
            let matrix = as_matrix(value).ok_or_else(unexpected)?;
            if matrix.len() == expected {
                matrix
            } else if expected == 1 {
                vec![mean_pool(&matrix).ok_or_else(unexpected)?]
            } else {
                return Err(unexpected());
            }
        }
        3 => {
            let items = value.as_array().ok_or_else(unexpected)?;
            items
                .iter()
                .map(|tokens| as_matrix(tokens).and_then(|m| mean_pool(&m)).ok_or_else(unexpected))
                .collect::<Result<Vec<_>>>()?
        }
        _ => return Err(unexpected()),
    };
    if rows.len() != expected {
        return Err(unexpected());
    }
    Ok(rows)
}

fn depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.first().map(depth).unwrap_or(0),
        _ => 0,
    }
}

fn as_vector(value: &Value) -> Option<Vec<f32>> {
    value.as_array()?.iter().map(|x| x.as_f64().map(|f| f as f32)).collect()
}

fn as_matrix(value: &Value) -> Option<Vec<Vec<f32>>> {
    value.as_array()?.iter().map(as_vector).collect()
}
