//! External model collaborators.
//!
//! The engine never embeds or generates text itself; it invokes these
//! two contracts on external services. Implementations must be
//! deterministic per input for [`Embedder`] (retrieval determinism
//! depends on it) and are expected to block only inside the async calls.

pub mod credentials;
pub mod openai;

pub use credentials::{CredentialsProvider, EnvCredentials, StaticCredentials};
pub use openai::{OpenAiEmbedder, OpenAiGenerator};

use async_trait::async_trait;

use crate::error::Result;

/// Batched text embedding: one vector per input text, aligned by index.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a batch of texts.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RetrievalError::EmbeddingFailed`] when the
    /// service call fails.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Single-shot text generation: prompt in, answer out.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates a completion for the prompt.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PipelineError::GenerationFailed`] when the
    /// service call fails.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
