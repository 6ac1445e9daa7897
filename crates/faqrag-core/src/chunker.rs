//! Splits extracted document text into retrievable chunks.
//!
//! Two modes:
//! - QA mode when the text carries `Q:`/`A:` markers: one chunk per pair.
//! - Sliding character window otherwise.

use serde::{Deserialize, Serialize};

const QA_SEPARATOR: &str = "\n\nQ:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters.
    pub window: usize,
    /// Characters shared by consecutive windows.
    pub overlap: usize,
    /// QA pairs with this many characters or fewer are dropped.
    pub min_pair_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { window: 1200, overlap: 120, min_pair_chars: 10 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Chunk `raw`; the chunk index is the position in the returned vector.
    pub fn chunk(&self, raw: &str) -> Vec<String> {
        if raw.contains("Q:") && raw.contains("A:") {
            self.chunk_qa(raw)
        } else {
            self.chunk_window(raw)
        }
    }

    fn chunk_qa(&self, raw: &str) -> Vec<String> {
        let pairs: Vec<String> = raw
            .split(QA_SEPARATOR)
            .enumerate()
            .map(|(i, part)| if i == 0 { part.trim().to_string() } else { format!("Q:{}", part).trim().to_string() })
            .filter(|pair| pair.chars().count() > self.config.min_pair_chars)
            .collect();

        if pairs.is_empty() {
            vec![raw.to_string()]
        } else {
            pairs
        }
    }

    fn chunk_window(&self, raw: &str) -> Vec<String> {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let chars: Vec<char> = normalized.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let window = self.config.window.max(1);
        let step = if self.config.overlap >= window { 1 } else { window - self.config.overlap };

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + window).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qa_pairs_split_on_blank_line_before_q() {
        let text = "Q: How do refunds work?\nA: Within 30 days.\n\nQ: Do you ship abroad?\nA: Yes, worldwide.";
        let chunks = Chunker::default().chunk(text);
        assert_eq!(
            chunks,
            vec![
                "Q: How do refunds work?\nA: Within 30 days.".to_string(),
                "Q: Do you ship abroad?\nA: Yes, worldwide.".to_string(),
            ]
        );
    }

    #[test]
    fn two_minimal_pairs_are_kept() {
        let chunks = Chunker::default().chunk("Q: A?\nA: B.\n\nQ: C?\nA: D.");
        assert_eq!(chunks, vec!["Q: A?\nA: B.".to_string(), "Q: C?\nA: D.".to_string()]);
        assert!(chunks.iter().all(|c| c.starts_with("Q:")));
    }

    #[test]
    fn short_pairs_are_dropped() {
        let text = "Q: Long enough question?\nA: Long enough answer.\n\nQ: x\nA:";
        let chunks = Chunker::default().chunk(text);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].starts_with("Q: Long enough"));
    }

    #[test]
    fn qa_without_surviving_pairs_returns_whole_text() {
        let text = "Q:A:";
        assert_eq!(Chunker::default().chunk(text), vec![text.to_string()]);
    }

    #[test]
    fn window_boundaries() {
        let text = "a".repeat(2500);
        let chunks = Chunker::default().chunk(&text);
        let lens: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        // starts at 0, 1080, 2160
        assert_eq!(lens, vec![1200, 1200, 340]);
    }

    #[test]
    fn window_covers_3000_chars_in_three_chunks() {
        let text: String = (0..3000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chars: Vec<char> = text.chars().collect();
        let span = |from: usize, to: usize| chars[from..to].iter().collect::<String>();

        let chunks = Chunker::default().chunk(&text);
        assert_eq!(chunks, vec![span(0, 1200), span(1080, 2280), span(2160, 3000)]);
    }

    #[test]
    fn window_exact_fit_yields_single_chunk() {
        let text = "b".repeat(1200);
        assert_eq!(Chunker::default().chunk(&text).len(), 1);
    }

    #[test]
    fn whitespace_is_collapsed() {
        let chunks = Chunker::default().chunk("  hello \n\n  world\t ");
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(Chunker::default().chunk("   \n ").is_empty());
    }

    #[test]
    fn counts_characters_not_bytes() {
        let chunker = Chunker::new(ChunkingConfig { window: 4, overlap: 1, min_pair_chars: 10 });
        let chunks = chunker.chunk("ééééééé");
        assert_eq!(chunks, vec!["éééé".to_string(), "éééé".to_string()]);
    }

    #[test]
    fn overlap_not_below_window_steps_by_one() {
        let chunker = Chunker::new(ChunkingConfig { window: 3, overlap: 5, min_pair_chars: 10 });
        assert_eq!(chunker.chunk("abcde"), vec!["abc", "bcd", "cde"]);
    }
}
