//! Reciprocal Rank Fusion for dense and sparse candidate lists.
//!
//! Based on: Cormack, Clarke, Buettcher (2009) - "Reciprocal Rank Fusion
//! outperforms Condorcet and individual Rank Learning Methods". RRF works
//! on ranks, not raw scores, which makes it robust to the heterogeneous
//! score scales of BM25 and inner-product similarity.

use std::collections::HashMap;

use crate::corpus::Chunk;

/// Configuration for one fusion pass.
#[derive(Debug, Clone, Copy)]
pub struct FusionConfig {
    /// Weight of the dense ranking; the sparse ranking gets `1 - alpha`.
    pub alpha: f64,
    /// Rank-smoothing constant (60 in the original paper).
    pub rrf_constant: f64,
}

impl FusionConfig {
    /// Creates a fusion config.
    #[must_use]
    pub const fn new(alpha: f64, rrf_constant: f64) -> Self {
        Self {
            alpha,
            rrf_constant,
        }
    }
}

/// A fused candidate with its source ranks.
#[derive(Debug, Clone)]
pub struct RankedResult {
    /// The deduplicated chunk.
    pub chunk: Chunk,
    /// 0-based rank in the dense list, if present there.
    pub dense_rank: Option<usize>,
    /// 0-based rank in the sparse list, if present there.
    pub sparse_rank: Option<usize>,
    /// Weighted RRF score.
    pub fused_score: f64,
}

/// Fuses a dense and a sparse ranking into one ordered candidate list.
///
/// For a candidate at dense rank `r_d` and sparse rank `r_s` (0-based),
/// the fused score is `alpha / (r_d + c) + (1 - alpha) / (r_s + c)`;
/// a missing rank contributes nothing. Candidates are deduplicated by
/// the chunk key (first 100 content characters); on collision the
/// representative with the richer metadata is kept.
///
/// Ordering is total and deterministic: fused score descending, then
/// dense rank ascending (absent last), then sparse rank ascending
/// (absent last), then chunk key.
#[must_use]
pub fn fuse(dense: &[Chunk], sparse: &[Chunk], config: &FusionConfig) -> Vec<RankedResult> {
    struct Entry {
        chunk: Chunk,
        dense_rank: Option<usize>,
        sparse_rank: Option<usize>,
    }

    let mut entries: HashMap<String, Entry> = HashMap::new();

    for (rank, chunk) in dense.iter().enumerate() {
        entries
            .entry(chunk.dedup_key().to_string())
            .or_insert_with(|| Entry {
                chunk: chunk.clone(),
                dense_rank: None,
                sparse_rank: None,
            })
            .dense_rank
            .get_or_insert(rank);
    }

    for (rank, chunk) in sparse.iter().enumerate() {
        let entry = entries
            .entry(chunk.dedup_key().to_string())
            .or_insert_with(|| Entry {
                chunk: chunk.clone(),
                dense_rank: None,
                sparse_rank: None,
            });
        entry.sparse_rank.get_or_insert(rank);
        if chunk.metadata.richness() > entry.chunk.metadata.richness() {
            entry.chunk = chunk.clone();
        }
    }

    let score_of = |rank: Option<usize>, weight: f64| {
        rank.map_or(0.0, |r| {
            #[allow(clippy::cast_precision_loss)]
            let r = r as f64;
            weight / (r + config.rrf_constant)
        })
    };

    let mut results: Vec<RankedResult> = entries
        .into_values()
        .map(|entry| {
            let fused_score = score_of(entry.dense_rank, config.alpha)
                + score_of(entry.sparse_rank, 1.0 - config.alpha);
            RankedResult {
                chunk: entry.chunk,
                dense_rank: entry.dense_rank,
                sparse_rank: entry.sparse_rank,
                fused_score,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| rank_key(a.dense_rank).cmp(&rank_key(b.dense_rank)))
            .then_with(|| rank_key(a.sparse_rank).cmp(&rank_key(b.sparse_rank)))
            .then_with(|| a.chunk.dedup_key().cmp(b.chunk.dedup_key()))
    });
    results
}

/// Maps an optional rank so that absent ranks order last.
const fn rank_key(rank: Option<usize>) -> usize {
    match rank {
        Some(r) => r,
        None => usize::MAX,
    }
}
