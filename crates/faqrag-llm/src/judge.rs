use anyhow::{bail, Context, Result};
use std::time::Duration;
use tracing::debug;

use faqrag_core::config::AppConfig;
use faqrag_core::traits::RelevanceJudge;

use crate::chat::ChatClient;

/// Asks the chat model for one relevance score between 0.0 and 1.0 per passage.
pub struct LlmRelevanceJudge {
    chat: ChatClient,
}

impl LlmRelevanceJudge {
    pub fn new(chat: ChatClient) -> Self {
        Self { chat }
    }

    /// `None` when the selected provider has no credential.
    pub fn from_config(cfg: &AppConfig) -> Result<Option<Self>> {
        let credential = cfg.api_credential();
        if credential.is_empty() {
            return Ok(None);
        }
        let chat = ChatClient::new(
            cfg.api_base_url(),
            credential.clone(),
            cfg.rerank_model(),
            Duration::from_secs(cfg.request_timeout_secs),
        )?;
        Ok(Some(Self::new(chat)))
    }
}

pub fn build_rerank_prompt(question: &str, passages: &[String]) -> String {
    let numbered = passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {}", i + 1, p))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Rate the relevance of each passage to the question on a scale of 0.0 to 1.0.\nQuestion: {question}\n\nPassages:\n{numbered}\n\nReturn only a comma-separated list of scores (e.g., 0.8,0.3,0.9):"
    )
}

/// Parse `0.8, 0.3,0.9`. Any non-numeric item is an error.
pub fn parse_scores(text: &str) -> Result<Vec<f32>> {
    let mut scores = Vec::new();
    for item in text.trim().split(',') {
        let item = item.trim();
        if item.is_empty() {
            bail!("empty score in {text:?}");
        }
        scores.push(item.parse::<f32>().with_context(|| format!("bad score {item:?}"))?);
    }
    Ok(scores)
}

impl RelevanceJudge for LlmRelevanceJudge {
    fn judge(&self, question: &str, passages: &[String]) -> Result<Vec<f32>> {
        let reply = self.chat.complete(&build_rerank_prompt(question, passages), 0.0)?;
        debug!(%reply, "relevance scores");
        parse_scores(&reply)
    }
}
