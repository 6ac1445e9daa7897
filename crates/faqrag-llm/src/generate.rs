//! Answer generation: chat model when configured, extractive otherwise.

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, warn};

use faqrag_core::config::GenerationBackend;
use faqrag_core::traits::AnswerGenerator;
use faqrag_core::types::{Answer, Citation, ScoredChunk};

use crate::chat::ChatClient;

pub const NOT_FOUND_ANSWER: &str = "I don't find this in the provided FAQs.";
const EXTRACT_CHARS: usize = 300;
const GENERATION_TEMPERATURE: f32 = 0.1;

/// Numbered `[i] file :: text` blocks separated by blank lines.
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[{}] {} :: {}", i + 1, c.file_name(), c.text()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(question: &str, chunks: &[ScoredChunk]) -> String {
    let context = format_context(chunks);
    format!(
        r#"You are a helpful FAQ assistant. Use ONLY the provided context to answer.
If the answer is not present, say: "I don't find this in the provided FAQs."

Question: {question}

Context:
{context}

Answer (be concise and reference the citations):"#
    )
}

/// "From {file}: {first 300 chars}" of the top chunk, citing every chunk.
pub fn extractive_answer(chunks: &[ScoredChunk]) -> Answer {
    let Some(top) = chunks.first() else { return not_found() };
    let excerpt: String = top.text().chars().take(EXTRACT_CHARS).collect();
    Answer { answer: format!("From {}: {}", top.file_name(), excerpt), citations: Citation::from_chunks(chunks) }
}

fn not_found() -> Answer {
    Answer { answer: NOT_FOUND_ANSWER.to_string(), citations: Vec::new() }
}

pub enum Generator {
    External(ChatClient),
    Extractive,
}

impl Generator {
    pub fn from_backend(backend: &GenerationBackend, timeout: Duration) -> Result<Self> {
        match backend {
            GenerationBackend::External { base_url, credential, model, provider } => {
                debug!(%provider, %model, "external answer generation");
                Ok(Generator::External(ChatClient::new(base_url, credential.clone(), model, timeout)?))
            }
            GenerationBackend::Extractive => Ok(Generator::Extractive),
        }
    }
}

impl AnswerGenerator for Generator {
    fn generate(&self, question: &str, chunks: &[ScoredChunk]) -> Answer {
        if chunks.is_empty() {
            return not_found();
        }
        match self {
            Generator::Extractive => extractive_answer(chunks),
            Generator::External(chat) => match chat.complete(&build_prompt(question, chunks), GENERATION_TEMPERATURE) {
                Ok(text) => Answer { answer: text, citations: Citation::from_chunks(chunks) },
                Err(e) => {
                    warn!(error = %e, "generation failed, falling back to extractive answer");
                    extractive_answer(chunks)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faqrag_core::types::{Chunk, ChunkMeta};

    fn scored(file: &str, text: &str) -> ScoredChunk {
        ScoredChunk::new(
            Chunk {
                id: 0,
                uid: "u".into(),
                text: text.into(),
                meta: ChunkMeta { file_name: file.into(), chunk_id: 0, page: None },
            },
            0.9,
        )
    }

    #[test]
    fn empty_context_is_not_found() {
        let answer = Generator::Extractive.generate("anything?", &[]);
        assert_eq!(answer.answer, NOT_FOUND_ANSWER);
        assert!(answer.citations.is_empty());
    }

    #[test]
    fn extractive_quotes_top_chunk_and_cites_all() {
        let chunks = vec![scored("faq.csv", &"x".repeat(500)), scored("other.md", "second")];
        let answer = Generator::Extractive.generate("q", &chunks);
        assert_eq!(answer.answer, format!("From faq.csv: {}", "x".repeat(300)));
        assert_eq!(answer.citations.len(), 2);
        assert_eq!(answer.citations[1].file, "other.md");
    }

    #[test]
    fn prompt_numbers_context_blocks() {
        let chunks = vec![scored("a.txt", "alpha"), scored("b.txt", "beta")];
        let prompt = build_prompt("What?", &chunks);
        assert!(prompt.contains("Question: What?"));
        assert!(prompt.contains("[1] a.txt :: alpha\n\n[2] b.txt :: beta"));
        assert!(prompt.ends_with("reference the citations):"));
    }

    #[test]
    fn placeholders_in_the_question_stay_literal() {
        let prompt = build_prompt("What does {context} mean?", &[scored("a.txt", "alpha")]);
        assert!(prompt.contains("Question: What does {context} mean?"));
        assert_eq!(prompt.matches("[1] a.txt :: alpha").count(), 1);
    }
}
