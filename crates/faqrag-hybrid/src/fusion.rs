//! Score-normalized union of the dense and sparse result lists.

use std::collections::HashMap;

use faqrag_core::types::ScoredChunk;

const DEGENERATE_SCORE: f32 = 0.5;

/// Min-max normalize to [0, 1]. A single score or a zero range maps to 0.5.
pub fn min_max(scores: &[f32]) -> Vec<f32> {
    let (lo, hi) = scores
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    let range = hi - lo;
    if scores.len() < 2 || !range.is_finite() || range <= 0.0 {
        return vec![DEGENERATE_SCORE; scores.len()];
    }
    scores.iter().map(|&s| ((s - lo) / range).clamp(0.0, 1.0)).collect()
}

/// Union of both lists keyed by `(file_name, chunk_id)`.
///
/// Dense scores land in [0.5, 1], sparse scores in [0, 0.5]. A key present in
/// both lists keeps the dense chunk with the higher of the two scores. Output is
/// sorted by score, descending, ties in insertion order.
pub fn merge_candidates(dense: &[ScoredChunk], sparse: &[ScoredChunk]) -> Vec<ScoredChunk> {
    let mut merged: Vec<ScoredChunk> = Vec::with_capacity(dense.len() + sparse.len());
    let mut slots: HashMap<(String, usize), usize> = HashMap::new();

    let dense_norm = min_max(&dense.iter().map(|c| c.score).collect::<Vec<_>>());
    for (item, norm) in dense.iter().zip(dense_norm) {
        let key = owned_key(item);
        if slots.contains_key(&key) {
            continue;
        }
        slots.insert(key, merged.len());
        merged.push(ScoredChunk::new(item.chunk.clone(), 0.5 + 0.5 * norm));
    }

    let sparse_norm = min_max(&sparse.iter().map(|c| c.score).collect::<Vec<_>>());
    let dense_slots = merged.len();
    for (item, norm) in sparse.iter().zip(sparse_norm) {
        let score = 0.5 * norm;
        match slots.get(&owned_key(item)) {
            Some(&slot) if slot < dense_slots => {
                let existing = &mut merged[slot];
                existing.score = existing.score.max(score);
            }
            Some(_) => {}
            None => {
                slots.insert(owned_key(item), merged.len());
                merged.push(ScoredChunk::new(item.chunk.clone(), score));
            }
        }
    }

    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged
}

fn owned_key(item: &ScoredChunk) -> (String, usize) {
    let (file, chunk_id) = item.chunk.fusion_key();
    (file.to_string(), chunk_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use faqrag_core::types::{Chunk, ChunkMeta};

    fn sc(id: u64, file: &str, chunk_id: usize, score: f32) -> ScoredChunk {
        ScoredChunk::new(
            Chunk {
                id,
                uid: format!("u{id}"),
                text: format!("text {id}"),
                meta: ChunkMeta { file_name: file.into(), chunk_id, page: None },
            },
            score,
        )
    }

    fn ids(list: &[ScoredChunk]) -> Vec<u64> {
        list.iter().map(|c| c.chunk.id).collect()
    }

    #[test]
    fn min_max_degenerate_cases() {
        assert_eq!(min_max(&[3.0]), vec![0.5]);
        assert_eq!(min_max(&[2.0, 2.0]), vec![0.5, 0.5]);
        assert_eq!(min_max(&[1.0, 3.0, 2.0]), vec![0.0, 1.0, 0.5]);
        assert!(min_max(&[]).is_empty());
    }

    #[test]
    fn dense_only_preserves_order_in_upper_half() {
        let dense = vec![sc(0, "a", 0, 0.9), sc(1, "a", 1, 0.7), sc(2, "a", 2, 0.1)];
        let merged = merge_candidates(&dense, &[]);
        assert_eq!(ids(&merged), vec![0, 1, 2]);
        assert!(merged.iter().all(|c| (0.5..=1.0).contains(&c.score)));
        assert_eq!(merged[0].score, 1.0);
        assert_eq!(merged[2].score, 0.5);
    }

    #[test]
    fn sparse_only_scores_stay_at_or_below_half() {
        let sparse = vec![sc(3, "b", 0, 12.0), sc(4, "b", 1, 4.0)];
        let merged = merge_candidates(&[], &sparse);
        assert_eq!(ids(&merged), vec![3, 4]);
        assert_eq!(merged[0].score, 0.5);
        assert_eq!(merged[1].score, 0.0);
    }

    #[test]
    fn shared_keys_keep_dense_entry_and_max_score() {
        let dense = vec![sc(0, "a", 0, 0.8), sc(1, "a", 1, 0.2)];
        let sparse = vec![sc(1, "a", 1, 9.0), sc(5, "c", 0, 1.0)];
        let merged = merge_candidates(&dense, &sparse);
        assert_eq!(ids(&merged), vec![0, 1, 5]);
        assert_eq!(merged[1].score, 0.5);
        assert_eq!(merged[2].score, 0.0);
        assert!(merged.iter().all(|c| (0.0..=1.0).contains(&c.score)));
    }

    #[test]
    fn duplicate_key_within_a_list_keeps_first() {
        let dense = vec![sc(0, "a", 0, 0.9), sc(7, "a", 0, 0.95), sc(1, "a", 1, 0.1)];
        let merged = merge_candidates(&dense, &[]);
        assert_eq!(ids(&merged), vec![0, 1]);
    }

    #[test]
    fn single_dense_hit_scores_three_quarters() {
        let merged = merge_candidates(&[sc(0, "a", 0, 0.3)], &[sc(9, "z", 0, 2.0)]);
        assert_eq!(merged[0].score, 0.75);
        assert_eq!(merged[1].score, 0.25);
    }
}
