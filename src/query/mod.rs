//! Query-time planning and retrieval.
//!
//! [`QueryClassifier`] turns a raw question into a [`QueryPlan`];
//! [`HybridRetriever`] executes the plan over the dual indices and
//! reports the [`RetrievalMode`] it actually used.

pub mod classifier;
pub mod fusion;
pub mod retriever;

pub use classifier::{ComplexityIndicators, ComplexityLevel, QueryClassifier, QueryPlan};
pub use fusion::{FusionConfig, RankedResult, fuse};
pub use retriever::{HybridRetriever, RetrievalMode, RetrievalOutcome};
