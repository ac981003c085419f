//! Generation-side pipeline.
//!
//! Everything between a ranked chunk list and the final answer: context
//! rendering, the citation-contract prompt, the coordinator that drives
//! one request end to end, and the post-processing of the model output.

pub mod context;
pub mod coordinator;
pub mod postprocess;
pub mod prompt;

pub use context::format_context;
pub use coordinator::{QueryPipeline, QueryRequest, QueryResponse, QueryTimings};
pub use postprocess::{AnnotatedAnswer, AnswerSpan, ProcessedAnswer, SpanKind, process};
pub use prompt::{CITATION_FORMAT, SYSTEM_PROMPT, build_prompt};
