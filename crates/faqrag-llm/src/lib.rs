//! Chat-model integrations: the OpenAI-compatible client, the answer
//! [`Generator`] and the reranker's [`LlmRelevanceJudge`].

pub mod chat;
pub mod generate;
pub mod judge;

pub use chat::ChatClient;
pub use generate::{Generator, NOT_FOUND_ANSWER};
pub use judge::LlmRelevanceJudge;
