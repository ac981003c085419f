//! End-to-end query pipeline.
//!
//! Coordinates one request: classify, retrieve, render context, build
//! the prompt, call the generative model, post-process the answer.
//! The coordinator owns the per-request deadline and never returns a
//! partial answer: deadline expiry abandons the in-flight call and the
//! request fails as a whole.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::{PipelineError, Result};
use crate::index::{DenseIndex, SparseIndex};
use crate::llm::{Embedder, Generator};
use crate::pipeline::context::format_context;
use crate::pipeline::postprocess::{AnnotatedAnswer, annotate, process};
use crate::pipeline::prompt::build_prompt;
use crate::query::{HybridRetriever, QueryClassifier, QueryPlan, RetrievalMode};

/// Answer returned when the request carries no question.
const NO_QUESTION_ANSWER: &str = "No se proporcionó ninguna pregunta.";

/// One pipeline request.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    /// The natural-language question.
    pub query: String,
    /// Force the exhaustiva level regardless of the complexity score.
    pub exhaustive: bool,
    /// Bypass the dense index entirely and retrieve with BM25 alone.
    pub sparse_only: bool,
    /// End-to-end deadline override; the configured total timeout applies
    /// when absent.
    pub deadline: Option<Duration>,
}

impl QueryRequest {
    /// Creates a request for a plain question.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            exhaustive: false,
            sparse_only: false,
            deadline: None,
        }
    }

    /// Sets the exhaustive flag.
    #[must_use]
    pub const fn exhaustive(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }

    /// Sets the sparse-only routing flag.
    #[must_use]
    pub const fn sparse_only(mut self, sparse_only: bool) -> Self {
        self.sparse_only = sparse_only;
        self
    }

    /// Sets the per-request deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Wall-clock timings captured per request.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct QueryTimings {
    /// Time spent in retrieval.
    pub retrieval_ms: u64,
    /// Time spent waiting on the generative model.
    pub generation_ms: u64,
    /// Total request time.
    pub total_ms: u64,
}

/// One pipeline response.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// Post-processed answer text.
    pub answer: String,
    /// Structured annotated spans of the answer.
    pub annotated: AnnotatedAnswer,
    /// Non-fatal contract violations found in the answer.
    pub warnings: Vec<String>,
    /// The retrieval plan that was executed.
    pub plan: QueryPlan,
    /// Retrieval strategy actually used.
    pub method: RetrievalMode,
    /// Number of chunks handed to the model.
    pub retrieved: usize,
    /// Request timings.
    pub timings: QueryTimings,
}

/// The query pipeline coordinator.
///
/// Holds the immutable indices and the two external collaborators;
/// every request runs against shared read-only state.
pub struct QueryPipeline {
    classifier: QueryClassifier,
    retriever: HybridRetriever,
    generator: Arc<dyn Generator>,
    config: Arc<EngineConfig>,
}

impl std::fmt::Debug for QueryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPipeline").finish_non_exhaustive()
    }
}

impl QueryPipeline {
    /// Assembles the pipeline from loaded indices and collaborators.
    #[must_use]
    pub fn new(
        sparse: Arc<SparseIndex>,
        dense: Arc<DenseIndex>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            classifier: QueryClassifier::new(config.clone()),
            retriever: HybridRetriever::new(sparse, dense, embedder, config.clone()),
            generator,
            config,
        }
    }

    /// Loads both index artifacts and assembles the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::IndexError::Unavailable`] when either
    /// artifact is missing; the engine refuses to start without its
    /// indices.
    pub fn load(
        paths: &crate::index::IndexPaths,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: Arc<EngineConfig>,
    ) -> Result<Self> {
        let sparse = Arc::new(SparseIndex::load(&paths.sparse)?);
        let dense = Arc::new(DenseIndex::load(&paths.dense)?);
        Ok(Self::new(sparse, dense, embedder, generator, config))
    }

    /// Runs one request end to end.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DeadlineExceeded`] when a deadline
    /// expires, [`PipelineError::GenerationFailed`] when the model call
    /// fails, and retrieval errors per their recovery rules.
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let deadline = request.deadline.unwrap_or(self.config.total_timeout);
        tokio::time::timeout(deadline, self.run(request))
            .await
            .map_err(|_| {
                PipelineError::DeadlineExceeded {
                    stage: "total".to_string(),
                }
                .into()
            })
            .and_then(|result| result)
    }

    async fn run(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let start = Instant::now();
        let query = request.query.trim();
        let plan = self.classifier.classify(query, request.exhaustive);

        if query.is_empty() {
            return Ok(QueryResponse {
                answer: NO_QUESTION_ANSWER.to_string(),
                annotated: annotate(NO_QUESTION_ANSWER),
                warnings: Vec::new(),
                plan,
                method: RetrievalMode::Sparse,
                retrieved: 0,
                timings: QueryTimings {
                    total_ms: elapsed_ms(start),
                    ..QueryTimings::default()
                },
            });
        }

        let retrieval_start = Instant::now();
        let outcome = if request.sparse_only {
            self.retriever.retrieve_sparse_only(query, &plan)?
        } else {
            self.retriever.retrieve(query, &plan).await?
        };
        let retrieval_ms = elapsed_ms(retrieval_start);

        let context = format_context(&outcome.chunks);
        let prompt = build_prompt(&context, query);

        let generation_start = Instant::now();
        let raw = tokio::time::timeout(
            self.config.generation_timeout,
            self.generator.generate(&prompt),
        )
        .await
        .map_err(|_| PipelineError::DeadlineExceeded {
            stage: "generation".to_string(),
        })??;
        let generation_ms = elapsed_ms(generation_start);

        let processed = process(&raw);
        let timings = QueryTimings {
            retrieval_ms,
            generation_ms,
            total_ms: elapsed_ms(start),
        };

        tracing::info!(
            level = plan.level.as_str(),
            k = plan.k,
            method = outcome.mode.as_str(),
            retrieved = outcome.chunks.len(),
            retrieval_ms = timings.retrieval_ms,
            generation_ms = timings.generation_ms,
            total_ms = timings.total_ms,
            warnings = processed.warnings.len(),
            "query completed"
        );

        Ok(QueryResponse {
            answer: processed.text,
            annotated: processed.annotated,
            warnings: processed.warnings,
            plan,
            method: outcome.mode,
            retrieved: outcome.chunks.len(),
            timings,
        })
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Chunk, ChunkMetadata};
    use crate::error::{Error, RetrievalError};
    use async_trait::async_trait;

    struct HashEmbedder;

    #[async_trait]
    impl Embedder for HashEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0f32; 8];
                    for (i, b) in t.bytes().enumerate() {
                        v[i % 8] += f32::from(b) / 255.0;
                    }
                    v
                })
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(RetrievalError::EmbeddingFailed("offline".to_string()).into())
        }
    }

    struct ScriptedGenerator {
        answer: String,
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.answer.clone())
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl Generator for SlowGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("tarde".to_string())
        }
    }

    struct BrokenGenerator;

    #[async_trait]
    impl Generator for BrokenGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(PipelineError::GenerationFailed("quota".to_string()).into())
        }
    }

    fn make_chunk(source: &str, content: &str) -> Chunk {
        Chunk::new(
            format!("[00:00:01 --> 00:00:04] {content}"),
            ChunkMetadata {
                source: source.to_string(),
                start_time: "00:00:01,100".to_string(),
                end_time: "00:00:04,900".to_string(),
                start_seconds: 1.1,
                end_seconds: 4.9,
                duration_seconds: 3.8,
                start_index: 1,
                end_index: 1,
                num_blocks: 1,
            },
        )
    }

    async fn build_pipeline(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: EngineConfig,
    ) -> QueryPipeline {
        let chunks = vec![
            make_chunk("a.srt", "el maestro habló del amor"),
            make_chunk("b.srt", "Alaniso guió la meditación"),
            make_chunk("c.srt", "la paz llega con la práctica"),
        ];
        let sparse = Arc::new(SparseIndex::build(&chunks));
        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = HashEmbedder.embed(&contents).await.unwrap();
        let dense = Arc::new(DenseIndex::from_parts(vectors, chunks).unwrap());
        QueryPipeline::new(sparse, dense, embedder, generator, Arc::new(config))
    }

    fn cited_answer() -> String {
        "El maestro enseñó sobre el amor \
         [Documento: a.srt | Timestamp: 00:00:01,100 --> 00:00:04,900] \
         \"el maestro habló del amor\"."
            .to_string()
    }

    fn small_config() -> EngineConfig {
        EngineConfig::new().with_depths(2, 3, 4, 6)
    }

    #[tokio::test]
    async fn test_happy_path_hybrid() {
        let pipeline = build_pipeline(
            Arc::new(HashEmbedder),
            Arc::new(ScriptedGenerator {
                answer: cited_answer(),
            }),
            small_config(),
        )
        .await;

        let response = pipeline
            .query(&QueryRequest::new("el amor y la práctica"))
            .await
            .unwrap();

        assert_eq!(response.method, RetrievalMode::Hybrid);
        assert!(response.retrieved > 0);
        // Sub-second precision stripped by the post-processor.
        assert!(response.answer.contains("00:00:01 --> 00:00:04"));
        assert!(!response.answer.contains(",100"));
        assert!(response.warnings.is_empty());
        assert!(response.timings.total_ms >= response.timings.retrieval_ms);
    }

    #[tokio::test]
    async fn test_empty_query_short_answer() {
        let pipeline = build_pipeline(
            Arc::new(HashEmbedder),
            Arc::new(ScriptedGenerator {
                answer: cited_answer(),
            }),
            small_config(),
        )
        .await;

        let response = pipeline.query(&QueryRequest::new("   ")).await.unwrap();
        assert_eq!(response.answer, NO_QUESTION_ANSWER);
        assert_eq!(response.retrieved, 0);
        assert_eq!(response.plan.k, 2);
        assert_eq!(response.plan.level.as_str(), "simple");
    }

    #[tokio::test]
    async fn test_embedding_failure_reports_sparse_method() {
        let pipeline = build_pipeline(
            Arc::new(FailingEmbedder),
            Arc::new(ScriptedGenerator {
                answer: cited_answer(),
            }),
            small_config(),
        )
        .await;

        let response = pipeline
            .query(&QueryRequest::new("la paz y la práctica"))
            .await
            .unwrap();
        assert_eq!(response.method, RetrievalMode::Sparse);
    }

    #[tokio::test]
    async fn test_generation_deadline() {
        let config = small_config().with_timeouts(
            Duration::from_secs(5),
            Duration::from_millis(20),
            Duration::from_secs(30),
        );
        let pipeline =
            build_pipeline(Arc::new(HashEmbedder), Arc::new(SlowGenerator), config).await;

        let err = pipeline
            .query(&QueryRequest::new("el amor"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "deadline_exceeded");
    }

    #[tokio::test]
    async fn test_total_deadline_override() {
        let pipeline =
            build_pipeline(Arc::new(HashEmbedder), Arc::new(SlowGenerator), small_config()).await;

        let request = QueryRequest::new("el amor").with_deadline(Duration::from_millis(30));
        let err = pipeline.query(&request).await.unwrap_err();
        assert_eq!(err.code(), "deadline_exceeded");
    }

    #[tokio::test]
    async fn test_generation_failure_no_partial_answer() {
        let pipeline = build_pipeline(
            Arc::new(HashEmbedder),
            Arc::new(BrokenGenerator),
            small_config(),
        )
        .await;

        let err = pipeline
            .query(&QueryRequest::new("el amor"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Pipeline(PipelineError::GenerationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_exhaustive_flag_reaches_plan() {
        let pipeline = build_pipeline(
            Arc::new(HashEmbedder),
            Arc::new(ScriptedGenerator {
                answer: cited_answer(),
            }),
            small_config(),
        )
        .await;

        let response = pipeline
            .query(&QueryRequest::new("el amor").exhaustive(true))
            .await
            .unwrap();
        assert_eq!(response.plan.level.as_str(), "exhaustiva");
        assert_eq!(response.plan.k, 6);
        assert_eq!(
            response.plan.reason,
            "Búsqueda exhaustiva activada manualmente"
        );
    }

    #[tokio::test]
    async fn test_sparse_only_request() {
        let pipeline = build_pipeline(
            Arc::new(HashEmbedder),
            Arc::new(ScriptedGenerator {
                answer: cited_answer(),
            }),
            small_config(),
        )
        .await;

        let response = pipeline
            .query(&QueryRequest::new("el amor").sparse_only(true))
            .await
            .unwrap();
        assert_eq!(response.method, RetrievalMode::Sparse);
        assert!(response.retrieved > 0);
    }

    #[tokio::test]
    async fn test_warnings_attached_not_fatal() {
        let pipeline = build_pipeline(
            Arc::new(HashEmbedder),
            Arc::new(ScriptedGenerator {
                answer: "una afirmación sin respaldo \"cita huérfana\"".to_string(),
            }),
            small_config(),
        )
        .await;

        let response = pipeline.query(&QueryRequest::new("el amor")).await.unwrap();
        assert_eq!(response.warnings.len(), 1);
        assert!(!response.answer.is_empty());
    }
}
