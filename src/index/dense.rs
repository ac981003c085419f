//! Dense vector index.
//!
//! Persists per-chunk embedding vectors aligned 1:1 with the chunk
//! array and answers top-K nearest-neighbor lookups by inner product.
//! The artifact is a directory holding the vectors and chunks as
//! separate JSON files that must round-trip through save/load.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::corpus::Chunk;
use crate::error::{IndexError, Result};

/// Vectors file inside the dense artifact directory.
const VECTORS_FILE: &str = "vectors.json";

/// Chunks file inside the dense artifact directory.
const CHUNKS_FILE: &str = "chunks.json";

/// Serialized shape of the vectors file. Compatibility is by field name.
#[derive(Serialize, Deserialize)]
struct VectorsArtifact {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

/// Dense nearest-neighbor index over chunk embeddings.
///
/// Immutable after construction; lookups only read state, so the index
/// is safe to share across concurrent requests.
#[derive(Debug, Clone)]
pub struct DenseIndex {
    vectors: Vec<Vec<f32>>,
    chunks: Vec<Chunk>,
    dimensions: usize,
}

impl DenseIndex {
    /// Builds the index from chunks and their pre-computed embeddings.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Misaligned`] when the arrays differ in
    /// length and [`IndexError::DimensionMismatch`] when vectors are
    /// ragged.
    pub fn from_parts(vectors: Vec<Vec<f32>>, chunks: Vec<Chunk>) -> Result<Self> {
        if vectors.len() != chunks.len() {
            return Err(IndexError::Misaligned {
                vectors: vectors.len(),
                chunks: chunks.len(),
            }
            .into());
        }
        let dimensions = vectors.first().map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
            return Err(IndexError::DimensionMismatch {
                expected: dimensions,
                actual: bad.len(),
            }
            .into());
        }
        Ok(Self {
            vectors,
            chunks,
            dimensions,
        })
    }

    /// Number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when the index holds no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Embedding dimensions of the stored vectors.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Returns the chunk for a chunk id.
    #[must_use]
    pub fn chunk(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    /// Top-K lookup by inner-product similarity, in rank order.
    ///
    /// Ordering is total: score descending, then chunk id ascending, so
    /// repeated calls are byte-for-byte identical.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DimensionMismatch`] when the query vector
    /// dimensions differ from the stored vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            }
            .into());
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .map(|v| inner_product(query, v))
            .enumerate()
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Saves the index into an artifact directory.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Serialization`] on write failure.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(IndexError::from)?;
        let vectors = serde_json::to_vec(&VectorsArtifact {
            dimensions: self.dimensions,
            vectors: self.vectors.clone(),
        })
        .map_err(IndexError::from)?;
        std::fs::write(dir.join(VECTORS_FILE), vectors).map_err(IndexError::from)?;

        let chunks = serde_json::to_vec(&self.chunks).map_err(IndexError::from)?;
        std::fs::write(dir.join(CHUNKS_FILE), chunks).map_err(IndexError::from)?;
        tracing::debug!(dir = %dir.display(), chunks = self.len(), "dense index saved");
        Ok(())
    }

    /// Loads the index from its artifact directory.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Unavailable`] when either file is missing
    /// or cannot be deserialized, and [`IndexError::Misaligned`] when
    /// the two files disagree.
    pub fn load(dir: &Path) -> Result<Self> {
        let read = |file: &str| -> Result<Vec<u8>> {
            let path = dir.join(file);
            std::fs::read(&path)
                .map_err(|e| {
                    IndexError::Unavailable {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    }
                    .into()
                })
        };

        let unavailable = |reason: String| IndexError::Unavailable {
            path: dir.display().to_string(),
            reason,
        };
        let artifact: VectorsArtifact = serde_json::from_slice(&read(VECTORS_FILE)?)
            .map_err(|e| unavailable(e.to_string()))?;
        let chunks: Vec<Chunk> =
            serde_json::from_slice(&read(CHUNKS_FILE)?).map_err(|e| unavailable(e.to_string()))?;

        let index = Self::from_parts(artifact.vectors, chunks)?;
        if !index.is_empty() && index.dimensions != artifact.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: artifact.dimensions,
                actual: index.dimensions,
            }
            .into());
        }
        tracing::debug!(dir = %dir.display(), chunks = index.len(), "dense index loaded");
        Ok(index)
    }
}

/// Inner product of two equal-length vectors.
#[must_use]
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
