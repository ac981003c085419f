//! Sparse lexical index (Okapi BM25).
//!
//! Persists tokenized chunks with document-frequency statistics and
//! scores a tokenized query against every chunk. The whole index is one
//! serialized artifact carrying the BM25 state plus the raw chunk texts
//! and metadata, so lookups can reconstruct full chunks without touching
//! the dense index.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::corpus::{Chunk, ChunkMetadata};
use crate::error::{IndexError, Result};
use crate::index::tokenize::tokenize;

/// Term-frequency saturation parameter.
pub const DEFAULT_K1: f32 = 1.5;

/// Document-length normalization parameter.
pub const DEFAULT_B: f32 = 0.75;

/// Corpus-level statistics written alongside the sparse artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Number of indexed chunks.
    pub total_docs: usize,
    /// Mean tokenized chunk length.
    pub avg_doc_length: f64,
    /// Total token count across the corpus.
    pub total_tokens: usize,
}

/// Okapi BM25 index over the chunk corpus.
///
/// Immutable after construction or load; scoring only reads state, so
/// the index is safe to share across concurrent requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparseIndex {
    /// Term-frequency saturation (k1).
    k1: f32,
    /// Length normalization (b).
    b: f32,
    /// Mean document length in tokens.
    avg_doc_length: f64,
    /// Inverse document frequency per term. `BTreeMap` keeps the
    /// serialized artifact byte-stable across rebuilds.
    idf: BTreeMap<String, f32>,
    /// Per-document term frequencies, aligned with `docs`.
    term_frequencies: Vec<BTreeMap<String, u32>>,
    /// Per-document token counts.
    doc_lengths: Vec<u32>,
    /// Raw chunk texts, aligned with `term_frequencies`.
    docs: Vec<String>,
    /// Chunk metadata, aligned with `docs`.
    metadatas: Vec<ChunkMetadata>,
}

impl SparseIndex {
    /// Builds the index from ingested chunks.
    ///
    /// Tokenization uses the shared contract tokenizer; index and query
    /// sides must agree or scores are meaningless.
    #[must_use]
    pub fn build(chunks: &[Chunk]) -> Self {
        let mut term_frequencies = Vec::with_capacity(chunks.len());
        let mut doc_lengths = Vec::with_capacity(chunks.len());
        let mut doc_frequency: BTreeMap<String, u32> = BTreeMap::new();

        for chunk in chunks {
            let tokens = tokenize(&chunk.content);
            let mut tf: BTreeMap<String, u32> = BTreeMap::new();
            for token in &tokens {
                *tf.entry(token.clone()).or_insert(0) += 1;
            }
            for term in tf.keys() {
                *doc_frequency.entry(term.clone()).or_insert(0) += 1;
            }
            doc_lengths.push(u32::try_from(tokens.len()).unwrap_or(u32::MAX));
            term_frequencies.push(tf);
        }

        let total_tokens: u64 = doc_lengths.iter().map(|&l| u64::from(l)).sum();
        #[allow(clippy::cast_precision_loss)]
        let avg_doc_length = if chunks.is_empty() {
            0.0
        } else {
            total_tokens as f64 / chunks.len() as f64
        };

        #[allow(clippy::cast_precision_loss)]
        let n = chunks.len() as f32;
        let idf = doc_frequency
            .into_iter()
            .map(|(term, df)| {
                #[allow(clippy::cast_precision_loss)]
                let df = df as f32;
                // Non-negative Okapi idf: ln(1 + (N - df + 0.5) / (df + 0.5))
                (term, (1.0 + (n - df + 0.5) / (df + 0.5)).ln())
            })
            .collect();

        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
            avg_doc_length,
            idf,
            term_frequencies,
            doc_lengths,
            docs: chunks.iter().map(|c| c.content.clone()).collect(),
            metadatas: chunks.iter().map(|c| c.metadata.clone()).collect(),
        }
    }

    /// Number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True when the index holds no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Corpus statistics for the stats sidecar and `status` output.
    #[must_use]
    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            total_docs: self.len(),
            avg_doc_length: self.avg_doc_length,
            total_tokens: self
                .doc_lengths
                .iter()
                .map(|&l| l as usize)
                .sum(),
        }
    }

    /// Scores the query tokens against every indexed chunk.
    ///
    /// Returns one BM25 score per chunk, aligned with chunk ids. Unknown
    /// terms contribute nothing.
    #[must_use]
    pub fn score_all(&self, tokens: &[String]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.len()];
        for term in tokens {
            let Some(&idf) = self.idf.get(term) else {
                continue;
            };
            for (doc_id, tf_map) in self.term_frequencies.iter().enumerate() {
                let Some(&tf) = tf_map.get(term) else {
                    continue;
                };
                #[allow(clippy::cast_precision_loss)]
                let tf = tf as f32;
                #[allow(clippy::cast_precision_loss)]
                let dl = f64::from(self.doc_lengths[doc_id]) / self.avg_doc_length.max(1e-9);
                #[allow(clippy::cast_possible_truncation)]
                let norm = self.k1 * (1.0 - self.b + self.b * dl as f32);
                scores[doc_id] += idf * tf * (self.k1 + 1.0) / (tf + norm);
            }
        }
        scores
    }

    /// Returns the top-`m` chunk ids by score, positive scores only.
    ///
    /// Ordering is total: score descending, then chunk id ascending, so
    /// repeated calls are byte-for-byte identical.
    #[must_use]
    pub fn top_m(&self, tokens: &[String], m: usize) -> Vec<(usize, f32)> {
        let scores = self.score_all(tokens);
        let mut ranked: Vec<(usize, f32)> = scores
            .into_iter()
            .enumerate()
            .filter(|&(_, score)| score > 0.0)
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(m);
        ranked
    }

    /// Reconstructs the full chunk for a chunk id.
    #[must_use]
    pub fn chunk(&self, id: usize) -> Option<Chunk> {
        let content = self.docs.get(id)?.clone();
        let metadata = self.metadatas.get(id)?.clone();
        Some(Chunk::new(content, metadata))
    }

    /// Saves the index as a single JSON artifact.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Serialization`] on write failure.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec(self).map_err(IndexError::from)?;
        std::fs::write(path, json).map_err(IndexError::from)?;
        tracing::debug!(path = %path.display(), docs = self.len(), "sparse index saved");
        Ok(())
    }

    /// Loads the index from its artifact.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Unavailable`] when the artifact is missing
    /// or cannot be deserialized.
    pub fn load(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| IndexError::Unavailable {
            path: path.display().to_string(),
            reason,
        };
        let bytes = std::fs::read(path).map_err(|e| unavailable(e.to_string()))?;
        let index: Self =
            serde_json::from_slice(&bytes).map_err(|e| unavailable(e.to_string()))?;
        tracing::debug!(path = %path.display(), docs = index.len(), "sparse index loaded");
        Ok(index)
    }
}
