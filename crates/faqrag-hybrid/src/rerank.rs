use tracing::{debug, warn};

use faqrag_core::traits::RelevanceJudge;
use faqrag_core::types::ScoredChunk;

/// Score every candidate gets when the judge has no usable opinion.
pub const NEUTRAL_SCORE: f32 = 0.5;

/// Optional second-pass scoring of the merged candidates.
pub struct Reranker {
    judge: Option<Box<dyn RelevanceJudge>>,
}

impl Reranker {
    pub fn new(judge: Option<Box<dyn RelevanceJudge>>) -> Self {
        Self { judge }
    }

    pub fn without_judge() -> Self {
        Self { judge: None }
    }

    /// Disabled or empty: the first `k` candidates unchanged. Otherwise one judge
    /// call, scores overwritten, stable sort descending, truncate to `k`.
    pub fn rerank(&self, question: &str, mut candidates: Vec<ScoredChunk>, k: usize, enabled: bool) -> Vec<ScoredChunk> {
        if !enabled || candidates.is_empty() {
            candidates.truncate(k);
            return candidates;
        }

        let scores = self.scores(question, &candidates);
        for (candidate, score) in candidates.iter_mut().zip(scores) {
            candidate.score = score;
        }
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(k);
        candidates
    }

    fn scores(&self, question: &str, candidates: &[ScoredChunk]) -> Vec<f32> {
        let neutral = vec![NEUTRAL_SCORE; candidates.len()];
        let Some(judge) = &self.judge else {
            warn!("rerank requested but no relevance judge is configured; using neutral scores");
            return neutral;
        };
        let passages: Vec<String> = candidates.iter().map(|c| c.text().to_string()).collect();
        match judge.judge(question, &passages) {
            Ok(scores) if scores.len() == candidates.len() => {
                debug!(?scores, "rerank scores");
                scores
            }
            Ok(scores) => {
                warn!(expected = candidates.len(), got = scores.len(), "reranking returned wrong number of scores");
                neutral
            }
            Err(e) => {
                warn!(error = %e, "reranking error");
                neutral
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faqrag_core::types::{Chunk, ChunkMeta};

    struct FixedJudge(Result<Vec<f32>, String>);

    impl RelevanceJudge for FixedJudge {
        fn judge(&self, _question: &str, _passages: &[String]) -> anyhow::Result<Vec<f32>> {
            self.0.clone().map_err(anyhow::Error::msg)
        }
    }

    fn candidates(n: u64) -> Vec<ScoredChunk> {
        (0..n)
            .map(|id| {
                ScoredChunk::new(
                    Chunk {
                        id,
                        uid: format!("u{id}"),
                        text: format!("passage {id}"),
                        meta: ChunkMeta { file_name: "f".into(), chunk_id: id as usize, page: None },
                    },
                    1.0 - id as f32 * 0.1,
                )
            })
            .collect()
    }

    fn ids(list: &[ScoredChunk]) -> Vec<u64> {
        list.iter().map(|c| c.chunk.id).collect()
    }

    #[test]
    fn disabled_truncates_without_rescoring() {
        let reranker = Reranker::new(Some(Box::new(FixedJudge(Ok(vec![0.0; 4])))));
        let out = reranker.rerank("q", candidates(4), 2, false);
        assert_eq!(ids(&out), vec![0, 1]);
        assert_eq!(out[0].score, 1.0);
    }

    #[test]
    fn judge_scores_reorder_candidates() {
        let reranker = Reranker::new(Some(Box::new(FixedJudge(Ok(vec![0.1, 0.9, 0.5])))));
        let out = reranker.rerank("q", candidates(3), 2, true);
        assert_eq!(ids(&out), vec![1, 2]);
        assert_eq!(out[0].score, 0.9);
    }

    #[test]
    fn wrong_length_falls_back_to_neutral_scores() {
        let reranker = Reranker::new(Some(Box::new(FixedJudge(Ok(vec![0.9])))));
        let out = reranker.rerank("q", candidates(3), 3, true);
        assert_eq!(ids(&out), vec![0, 1, 2]);
        assert!(out.iter().all(|c| c.score == NEUTRAL_SCORE));
    }

    #[test]
    fn judge_error_falls_back_to_neutral_scores() {
        let reranker = Reranker::new(Some(Box::new(FixedJudge(Err("timeout".into())))));
        let out = reranker.rerank("q", candidates(2), 5, true);
        assert_eq!(ids(&out), vec![0, 1]);
        assert!(out.iter().all(|c| c.score == NEUTRAL_SCORE));
    }

    #[test]
    fn missing_judge_and_empty_input() {
        let reranker = Reranker::without_judge();
        let out = reranker.rerank("q", candidates(2), 1, true);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].score, NEUTRAL_SCORE);
        assert!(reranker.rerank("q", Vec::new(), 3, true).is_empty());
    }
}
