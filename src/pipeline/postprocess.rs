//! Answer post-processing.
//!
//! Applied to the raw model output in order: strip sub-second precision
//! from timestamps, tag citation markers and quoted literals as
//! structured spans, then run the non-fatal contract validation. The
//! annotated value is presentation-free; rendering (HTML, ANSI) is a
//! consumer concern.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Characters of slack between a citation marker and its quotation
/// (and vice versa) before validation flags the pair as broken.
const PAIR_WINDOW: usize = 60;

#[allow(clippy::unwrap_used)]
static SUBSECOND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2}:\d{2}:\d{2}),\d{3}").unwrap());

#[allow(clippy::unwrap_used)]
static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[Documento:\s*[^|\]]+\|\s*Timestamp:\s*\d{2}:\d{2}:\d{2}\s*-->\s*\d{2}:\d{2}:\d{2}\]")
        .unwrap()
});

#[allow(clippy::unwrap_used)]
static QUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""[^"\n]+""#).unwrap());

/// Kind of an annotated answer span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    /// Unmarked prose.
    Plain,
    /// A `[Documento: ... | Timestamp: ...]` citation marker.
    Citation,
    /// A double-quoted verbatim literal.
    Quote,
}

/// One contiguous run of answer text with a presentation tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerSpan {
    /// Span text, exactly as it appears in the processed answer.
    pub text: String,
    /// Presentation tag.
    pub kind: SpanKind,
}

/// The structured, presentation-free annotated answer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnotatedAnswer {
    /// Spans in answer order; concatenating them restores the answer.
    pub spans: Vec<AnswerSpan>,
}

impl AnnotatedAnswer {
    /// Reassembles the plain answer text from the spans.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Fully post-processed answer.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedAnswer {
    /// Answer text with sub-second precision stripped.
    pub text: String,
    /// Structured spans for presentation layers.
    pub annotated: AnnotatedAnswer,
    /// Non-fatal contract violations found during validation.
    pub warnings: Vec<String>,
}

/// Runs the full post-processing chain on a raw model answer.
#[must_use]
pub fn process(raw: &str) -> ProcessedAnswer {
    let text = strip_subseconds(raw);
    let annotated = annotate(&text);
    let warnings = validate(&text);
    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "answer failed contract validation");
    }
    ProcessedAnswer {
        text,
        annotated,
        warnings,
    }
}

/// Rewrites every `HH:MM:SS,mmm` sequence to `HH:MM:SS`.
#[must_use]
pub fn strip_subseconds(text: &str) -> String {
    SUBSECOND.replace_all(text, "$1").into_owned()
}

/// Splits the answer into plain, citation, and quote spans.
#[must_use]
pub fn annotate(text: &str) -> AnnotatedAnswer {
    let mut marks: Vec<(usize, usize, SpanKind)> = CITATION
        .find_iter(text)
        .map(|m| (m.start(), m.end(), SpanKind::Citation))
        .chain(
            QUOTE
                .find_iter(text)
                .map(|m| (m.start(), m.end(), SpanKind::Quote)),
        )
        .collect();
    marks.sort_by_key(|&(start, end, _)| (start, end));

    let mut spans = Vec::new();
    let mut cursor = 0;
    for (start, end, kind) in marks {
        if start < cursor {
            continue;
        }
        if start > cursor {
            spans.push(AnswerSpan {
                text: text[cursor..start].to_string(),
                kind: SpanKind::Plain,
            });
        }
        spans.push(AnswerSpan {
            text: text[start..end].to_string(),
            kind,
        });
        cursor = end;
    }
    if cursor < text.len() {
        spans.push(AnswerSpan {
            text: text[cursor..].to_string(),
            kind: SpanKind::Plain,
        });
    }
    AnnotatedAnswer { spans }
}

/// Structural contract validation, non-fatal.
///
/// Checks that every citation marker is followed by a quoted literal
/// within a small window and that every quoted literal is preceded by a
/// citation marker within the same window.
#[must_use]
pub fn validate(text: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let citations: Vec<(usize, usize)> = CITATION
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();
    let quotes: Vec<(usize, usize)> = QUOTE
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();

    for &(start, end) in &citations {
        let followed = quotes
            .iter()
            .any(|&(q_start, _)| q_start >= end && q_start - end <= PAIR_WINDOW);
        if !followed {
            warnings.push(format!(
                "cita sin transcripción literal: {}",
                snippet(&text[start..end])
            ));
        }
    }

    for &(q_start, _) in &quotes {
        let preceded = citations
            .iter()
            .any(|&(_, c_end)| c_end <= q_start && q_start - c_end <= PAIR_WINDOW);
        if !preceded {
            warnings.push(format!(
                "transcripción sin cita previa: {}",
                snippet(&text[q_start..])
            ));
        }
    }

    warnings
}

/// Shortens a span for warning messages.
fn snippet(text: &str) -> &str {
    let mut end = text.len().min(48);
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
