//! OpenAI-compatible implementations of the model traits.
//!
//! Both collaborators go through `async-openai` against any
//! OpenAI-compatible endpoint; the base URL comes from the injected
//! credentials provider, so a self-hosted gateway works unchanged.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    CreateEmbeddingRequestArgs,
};
use async_trait::async_trait;

use crate::error::{PipelineError, Result, RetrievalError};
use crate::llm::credentials::CredentialsProvider;
use crate::llm::{Embedder, Generator};

/// Default multilingual embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default generation model.
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature: small but nonzero.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

fn build_client(credentials: &dyn CredentialsProvider) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::new().with_api_key(credentials.api_key()?);
    if let Some(base) = credentials.api_base() {
        config = config.with_api_base(base);
    }
    Ok(Client::with_config(config))
}

/// Embedding collaborator backed by an OpenAI-compatible endpoint.
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    /// Creates an embedder with the default model.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Config`] when credentials are missing.
    pub fn new(credentials: &dyn CredentialsProvider) -> Result<Self> {
        Self::with_model(credentials, DEFAULT_EMBEDDING_MODEL)
    }

    /// Creates an embedder with an explicit model name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Config`] when credentials are missing.
    pub fn with_model(credentials: &dyn CredentialsProvider, model: &str) -> Result<Self> {
        Ok(Self {
            client: build_client(credentials)?,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let failed = |reason: String| RetrievalError::EmbeddingFailed(reason);

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts.to_vec())
            .build()
            .map_err(|e| failed(e.to_string()))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| failed(e.to_string()))?;

        if response.data.len() != texts.len() {
            return Err(failed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            ))
            .into());
        }

        // The API may return entries out of order; re-align by index.
        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

/// Generation collaborator backed by an OpenAI-compatible endpoint.
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    /// Creates a generator with the default model and temperature.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Config`] when credentials are missing.
    pub fn new(credentials: &dyn CredentialsProvider) -> Result<Self> {
        Self::with_model(credentials, DEFAULT_GENERATION_MODEL, DEFAULT_TEMPERATURE)
    }

    /// Creates a generator with an explicit model and temperature.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Config`] when credentials are missing.
    pub fn with_model(
        credentials: &dyn CredentialsProvider,
        model: &str,
        temperature: f32,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(credentials)?,
            model: model.to_string(),
            temperature,
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let failed = |reason: String| PipelineError::GenerationFailed(reason);

        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| failed(e.to_string()))?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages(vec![message.into()])
            .build()
            .map_err(|e| failed(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| failed(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| failed("model returned no content".to_string()).into())
    }
}
