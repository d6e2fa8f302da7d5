use std::cmp::Ordering;

use common::storage::types::knowledge_entry::KnowledgeEntry;

use crate::ScoredEntry;

/// Cosine similarity between two vectors.
///
/// Vectors are compared positionally; when lengths differ the shorter
/// vector's missing components count as zero, while each norm is taken over
/// the full vector so the score stays symmetric. A zero magnitude on either
/// side yields 0.0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Scores every embedded entry against the query vector and keeps the
/// `top_k` best. Entries without an embedding do not participate. The sort
/// is stable and descending, so equal scores preserve the supplied order.
pub fn rank_entries(
    query: &[f32],
    entries: Vec<KnowledgeEntry>,
    top_k: usize,
) -> Vec<ScoredEntry> {
    let mut scored: Vec<ScoredEntry> = entries
        .into_iter()
        .filter_map(|entry| {
            let score = entry
                .embedding
                .as_deref()
                .map(|embedding| cosine_similarity(query, embedding))?;
            Some(ScoredEntry { entry, score })
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    scored
}
