//! # testigo
//!
//! Forensic retrieval-augmented question answering over a fixed corpus
//! of subtitle transcripts. A question comes in; an answer grounded in
//! verbatim quoted excerpts comes out, each excerpt annotated with its
//! source file and timestamp range.
//!
//! ## Architecture
//!
//! - **Ingestion** ([`srt`]): parse `.srt` files into timestamped
//!   blocks and group them into overlapping chunks.
//! - **Indices** ([`index`]): an immutable dense vector index and an
//!   immutable BM25 index over the same chunk id space.
//! - **Planning & retrieval** ([`query`]): a deterministic classifier
//!   picks the retrieval depth and routing, a hybrid retriever fuses
//!   both indices with Reciprocal Rank Fusion.
//! - **Generation** ([`pipeline`]): context rendering, the citation
//!   contract prompt, the coordinator, and answer post-processing.
//! - **Collaborators** ([`llm`]): the external embedding and generation
//!   services, specified by trait.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod llm;
pub mod pipeline;
pub mod query;
pub mod srt;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use config::{EngineConfig, NameVocabulary};
pub use corpus::{Chunk, ChunkMetadata};

// Re-export index types
pub use index::{CorpusStats, DenseIndex, IndexPaths, SparseIndex, tokenize};

// Re-export query types
pub use query::{
    ComplexityLevel, HybridRetriever, QueryClassifier, QueryPlan, RetrievalMode, RetrievalOutcome,
};

// Re-export pipeline types
pub use pipeline::{QueryPipeline, QueryRequest, QueryResponse};

// Re-export collaborator traits
pub use llm::{CredentialsProvider, Embedder, Generator};
