//! Hybrid retrieval over the dense and sparse indices.
//!
//! Orchestrates the dual-index lookup for one query: sparse BM25 first,
//! an optional lexical short-circuit, then the dense lookup and weighted
//! Reciprocal Rank Fusion. Dense failures degrade the request to
//! sparse-only; the sparse index is the safety net and its failure is
//! fatal for the request.

use std::sync::Arc;

use crate::config::{EngineConfig, MAX_CANDIDATES};
use crate::corpus::Chunk;
use crate::error::{Result, RetrievalError};
use crate::index::{DenseIndex, SparseIndex, tokenize};
use crate::llm::Embedder;
use crate::query::classifier::QueryPlan;
use crate::query::fusion::{FusionConfig, fuse};

/// The retrieval strategy actually used for a request.
///
/// A closed set: each request ends in exactly one of these states and
/// reports it to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Dense and sparse rankings fused.
    Hybrid,
    /// Sparse-only: lexical short-circuit or dense degradation.
    Sparse,
    /// Dense-only: the sparse ranking contributed no candidates.
    Dense,
}

impl RetrievalMode {
    /// Stable lowercase name used in responses and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hybrid => "hybrid",
            Self::Sparse => "sparse",
            Self::Dense => "dense",
        }
    }
}

impl std::fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one retrieval pass.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    /// Retrieved chunks, best first, at most `plan.k`.
    pub chunks: Vec<Chunk>,
    /// Strategy that actually produced the chunks.
    pub mode: RetrievalMode,
}

/// Hybrid retriever over the two process-wide indices.
///
/// The indices are immutable after load and shared across concurrent
/// requests; each call allocates only its own candidate lists.
pub struct HybridRetriever {
    sparse: Arc<SparseIndex>,
    dense: Arc<DenseIndex>,
    embedder: Arc<dyn Embedder>,
    config: Arc<EngineConfig>,
}

impl HybridRetriever {
    /// Creates a retriever over loaded indices.
    #[must_use]
    pub fn new(
        sparse: Arc<SparseIndex>,
        dense: Arc<DenseIndex>,
        embedder: Arc<dyn Embedder>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            sparse,
            dense,
            embedder,
            config,
        }
    }

    /// Retrieves up to `plan.k` chunks for the query.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::SparseSearchFailed`] when the sparse
    /// index cannot serve as the safety net (it is empty). Dense and
    /// embedding failures are recovered by degrading to sparse-only.
    pub async fn retrieve(&self, query: &str, plan: &QueryPlan) -> Result<RetrievalOutcome> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Ok(RetrievalOutcome {
                chunks: Vec::new(),
                mode: RetrievalMode::Sparse,
            });
        }
        if self.sparse.is_empty() {
            return Err(RetrievalError::SparseSearchFailed(
                "sparse index holds no documents".to_string(),
            )
            .into());
        }

        let multiplier = if plan.force_lexical { 4 } else { 2 };
        let m = (plan.k * multiplier).min(MAX_CANDIDATES);
        let sparse_ranked = self.sparse_candidates(&tokens, plan, m);

        // Lexical short-circuit: proper-noun queries with enough sparse
        // hits never touch the dense index.
        if plan.force_lexical && sparse_ranked.len() >= plan.k / 2 {
            tracing::debug!(hits = sparse_ranked.len(), k = plan.k, "lexical short-circuit");
            return Ok(RetrievalOutcome {
                chunks: self.sparse_chunks(&sparse_ranked, plan.k),
                mode: RetrievalMode::Sparse,
            });
        }

        let dense_ranked = match self.dense_candidates(query, plan.k * 2).await {
            Ok(ranked) => ranked,
            Err(err) => {
                tracing::warn!(error = %err, "dense lookup failed, degrading to sparse-only");
                return Ok(RetrievalOutcome {
                    chunks: self.sparse_chunks(&sparse_ranked, plan.k),
                    mode: RetrievalMode::Sparse,
                });
            }
        };

        let alpha = if plan.force_lexical {
            self.config.alpha_lexical
        } else {
            self.config.alpha_default
        };
        let fusion = FusionConfig::new(alpha, self.config.rrf_constant);

        let sparse_chunks = self.sparse_chunks(&sparse_ranked, plan.k * 2);
        let mode = match (dense_ranked.is_empty(), sparse_chunks.is_empty()) {
            (false, true) => RetrievalMode::Dense,
            (true, false) => RetrievalMode::Sparse,
            _ => RetrievalMode::Hybrid,
        };

        let mut chunks: Vec<Chunk> = fuse(&dense_ranked, &sparse_chunks, &fusion)
            .into_iter()
            .map(|r| r.chunk)
            .collect();
        chunks.truncate(plan.k);

        Ok(RetrievalOutcome { chunks, mode })
    }

    /// Retrieves up to `plan.k` chunks using the sparse index alone.
    ///
    /// Used when the caller explicitly bypasses the dense index, e.g.
    /// when the embedding service is known to be unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::SparseSearchFailed`] when the sparse
    /// index is empty.
    pub fn retrieve_sparse_only(&self, query: &str, plan: &QueryPlan) -> Result<RetrievalOutcome> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Ok(RetrievalOutcome {
                chunks: Vec::new(),
                mode: RetrievalMode::Sparse,
            });
        }
        if self.sparse.is_empty() {
            return Err(RetrievalError::SparseSearchFailed(
                "sparse index holds no documents".to_string(),
            )
            .into());
        }

        let ranked = self.sparse_candidates(&tokens, plan, plan.k);
        Ok(RetrievalOutcome {
            chunks: self.sparse_chunks(&ranked, plan.k),
            mode: RetrievalMode::Sparse,
        })
    }

    /// Ranks sparse candidates for the query, unioning in the
    /// supplementary per-name lookups for collective-name questions.
    ///
    /// The union is re-sorted by the main query's score so ordering
    /// stays comparable, positive scores only.
    fn sparse_candidates(
        &self,
        tokens: &[String],
        plan: &QueryPlan,
        m: usize,
    ) -> Vec<(usize, f32)> {
        if plan.supplementary_terms.is_empty() {
            return self.sparse.top_m(tokens, m);
        }

        let scores = self.sparse.score_all(tokens);
        let mut pool: std::collections::BTreeSet<usize> =
            self.sparse.top_m(tokens, m).into_iter().map(|(id, _)| id).collect();

        let depth = self.config.name_vocabulary.per_name_depth;
        for name in &plan.supplementary_terms {
            for (id, _) in self.sparse.top_m(&tokenize(name), depth) {
                pool.insert(id);
            }
        }

        let mut ranked: Vec<(usize, f32)> = pool
            .into_iter()
            .map(|id| (id, scores[id]))
            .filter(|&(_, score)| score > 0.0)
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate((plan.k * 4).min(MAX_CANDIDATES));
        ranked
    }

    /// Materializes ranked sparse ids into chunks, best first.
    fn sparse_chunks(&self, ranked: &[(usize, f32)], limit: usize) -> Vec<Chunk> {
        ranked
            .iter()
            .take(limit)
            .filter_map(|&(id, _)| self.sparse.chunk(id))
            .collect()
    }

    /// Embeds the query and ranks dense candidates.
    async fn dense_candidates(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        let texts = [query.to_string()];
        let embed = self.embedder.embed(&texts);
        let vectors = tokio::time::timeout(self.config.embedding_timeout, embed)
            .await
            .map_err(|_| {
                RetrievalError::EmbeddingFailed(format!(
                    "timed out after {:?}",
                    self.config.embedding_timeout
                ))
            })??;
        let query_vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::EmbeddingFailed("empty embedding batch".to_string()))?;

        let ranked = self
            .dense
            .search(&query_vector, k)
            .map_err(|e| RetrievalError::DenseSearchFailed(e.to_string()))?;

        Ok(ranked
            .into_iter()
            .filter_map(|(id, _)| self.dense.chunk(id).cloned())
            .collect())
    }
}
