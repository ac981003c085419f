//! Error types for testigo operations.
//!
//! This module provides the error hierarchy using `thiserror` for all
//! engine operations including ingestion, index persistence, retrieval,
//! and the query pipeline.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for engine operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Corpus ingestion errors (SRT parsing, chunking).
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Index artifact errors (load, save, alignment).
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Retrieval errors (embedding, dense/sparse lookup).
    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Pipeline errors (generation, deadlines).
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

impl Error {
    /// Returns the short, stable error code surfaced to callers.
    ///
    /// Internal detail (paths, upstream messages) is logged but the code
    /// is what API consumers should branch on.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Ingest(_) => "malformed_corpus_entry",
            Self::Index(_) => "index_unavailable",
            Self::Retrieval(e) => match e {
                RetrievalError::EmbeddingFailed(_) => "embedding_failed",
                RetrievalError::DenseSearchFailed(_) => "dense_search_failed",
                RetrievalError::SparseSearchFailed(_) => "retrieval_failed",
            },
            Self::Pipeline(e) => match e {
                PipelineError::GenerationFailed(_) => "generation_failed",
                PipelineError::DeadlineExceeded { .. } => "deadline_exceeded",
                PipelineError::ServiceUnavailable { .. } => "service_unavailable",
            },
            Self::Config { .. } => "invalid_config",
        }
    }
}

/// Ingestion-specific errors for corpus parsing.
///
/// Per-file failures are recoverable: the loader skips the file and
/// records it in the ingestion statistics.
#[derive(Error, Debug)]
pub enum IngestError {
    /// A source file could not be parsed as SRT.
    #[error("malformed corpus entry: {file}: {reason}")]
    MalformedEntry {
        /// File name that failed to parse.
        file: String,
        /// Reason for failure.
        reason: String,
    },

    /// A source file could not be read.
    #[error("failed to read corpus file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// The corpus directory contains no parseable files.
    #[error("no subtitle files found under: {path}")]
    EmptyCorpus {
        /// Corpus directory that was scanned.
        path: String,
    },
}

/// Index artifact errors.
#[derive(Error, Debug)]
pub enum IndexError {
    /// An index artifact is missing or cannot be loaded. Fatal at startup.
    #[error("index artifact unavailable: {path}: {reason}")]
    Unavailable {
        /// Path to the artifact.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Artifact serialization or deserialization failed.
    #[error("index serialization error: {0}")]
    Serialization(String),

    /// Vector and chunk arrays are not aligned 1:1.
    #[error("dense index misaligned: {vectors} vectors vs {chunks} chunks")]
    Misaligned {
        /// Number of stored vectors.
        vectors: usize,
        /// Number of stored chunks.
        chunks: usize,
    },

    /// Query vector dimensions do not match the stored vectors.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensions of the stored vectors.
        expected: usize,
        /// Dimensions of the query vector.
        actual: usize,
    },
}

/// Retrieval errors during a query.
///
/// Embedding and dense failures are recovered locally by degrading to
/// sparse-only retrieval. A sparse failure is fatal for the request,
/// since BM25 is the safety net.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The embedding call raised or timed out.
    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    /// The dense index lookup failed.
    #[error("dense search failed: {0}")]
    DenseSearchFailed(String),

    /// The sparse index lookup failed.
    #[error("sparse search failed: {0}")]
    SparseSearchFailed(String),
}

/// Pipeline errors surfaced to the caller.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The generative model call failed. No partial answer is returned.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// A per-request deadline expired; the in-flight call was abandoned.
    #[error("deadline exceeded during {stage}")]
    DeadlineExceeded {
        /// Pipeline stage that timed out ("embedding", "generation", "total").
        stage: String,
    },

    /// The engine cannot serve requests (an index failed to load).
    #[error("service unavailable: {reason}")]
    ServiceUnavailable {
        /// Reason the engine is unavailable.
        reason: String,
    },
}

impl From<std::io::Error> for IndexError {
    fn from(err: std::io::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config {
            message: "bad alpha".to_string(),
        };
        assert_eq!(err.to_string(), "configuration error: bad alpha");
    }

    #[test]
    fn test_ingest_error_display() {
        let err = IngestError::MalformedEntry {
            file: "charla_01.srt".to_string(),
            reason: "missing timestamp arrow".to_string(),
        };
        assert!(err.to_string().contains("charla_01.srt"));
        assert!(err.to_string().contains("missing timestamp arrow"));

        let err = IngestError::EmptyCorpus {
            path: "/tmp/corpus".to_string(),
        };
        assert!(err.to_string().contains("/tmp/corpus"));
    }

    #[test]
    fn test_index_error_display() {
        let err = IndexError::Misaligned {
            vectors: 10,
            chunks: 12,
        };
        assert_eq!(
            err.to_string(),
            "dense index misaligned: 10 vectors vs 12 chunks"
        );

        let err = IndexError::DimensionMismatch {
            expected: 768,
            actual: 384,
        };
        assert!(err.to_string().contains("768"));
        assert!(err.to_string().contains("384"));
    }

    #[test]
    fn test_error_codes_stable() {
        let err: Error = RetrievalError::EmbeddingFailed("boom".to_string()).into();
        assert_eq!(err.code(), "embedding_failed");

        let err: Error = RetrievalError::SparseSearchFailed("boom".to_string()).into();
        assert_eq!(err.code(), "retrieval_failed");

        let err: Error = PipelineError::DeadlineExceeded {
            stage: "generation".to_string(),
        }
        .into();
        assert_eq!(err.code(), "deadline_exceeded");

        let err: Error = IndexError::Unavailable {
            path: "sparse_index.json".to_string(),
            reason: "not found".to_string(),
        }
        .into();
        assert_eq!(err.code(), "index_unavailable");
    }

    #[test]
    fn test_error_from_ingest() {
        let err: Error = IngestError::EmptyCorpus {
            path: "x".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Ingest(_)));
    }

    #[test]
    fn test_error_from_pipeline() {
        let err: Error = PipelineError::GenerationFailed("quota".to_string()).into();
        assert!(matches!(err, Error::Pipeline(_)));
        assert_eq!(err.code(), "generation_failed");
    }

    #[test]
    fn test_index_error_from_serde() {
        let json_err: serde_json::Error = serde_json::from_str::<i32>("nope").unwrap_err();
        let err: IndexError = json_err.into();
        assert!(matches!(err, IndexError::Serialization(_)));
    }
}
