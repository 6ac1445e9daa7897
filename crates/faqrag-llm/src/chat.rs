use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use faqrag_core::config::Secret;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Minimal OpenAI-compatible chat-completions client (OpenAI and Groq).
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: Secret,
    model: String,
}

impl ChatClient {
    pub fn new(base_url: &str, api_key: Secret, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().context("building HTTP client")?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key, model: model.to_string() })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single user-message completion; returns the trimmed reply.
    pub fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, model = %self.model, "chat completion");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&ChatRequest {
                model: &self.model,
                messages: [ChatMessage { role: "user", content: prompt }],
                temperature,
            })
            .send()
            .context("chat request failed")?
            .error_for_status()
            .context("chat request rejected")?;
        let parsed: ChatResponse = resp.json().context("invalid chat response")?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow!("chat response has no content"))
    }
}
