//! Query classification and retrieval planning.
//!
//! Inspects the raw question and produces a [`QueryPlan`]: the retrieval
//! depth K derived from a deterministic complexity score, and the
//! routing flags that decide when lexical matching must dominate
//! (proper nouns, identity questions, collective-name questions).

use std::sync::Arc;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::index::tokenize;

/// Spanish conjunctions that hint at compound questions.
const CONJUNCTIONS: &[&str] = &[
    "y",
    "o",
    "además",
    "también",
    "asimismo",
    "por otro lado",
    "en relación",
    "respecto a",
];

/// Keywords that mark analytically demanding questions.
const COMPLEX_KEYWORDS: &[&str] = &[
    "compara",
    "contrasta",
    "analiza",
    "profundiza",
    "explica detalladamente",
    "todos los",
    "todas las",
    "exhaustivamente",
    "completamente",
    "en profundidad",
    "detallado",
    "extenso",
    "amplio",
];

/// Keywords that ask for enumerations.
const LISTING_KEYWORDS: &[&str] = &[
    "lista",
    "enumera",
    "cuáles son",
    "qué son",
    "menciona todos",
    "dame todos",
    "dame todas",
];

/// Patterns that ask for names or identities.
const NAME_PATTERNS: &[&str] = &[
    "nombre",
    "nombres",
    "quien",
    "quienes",
    "guardianes",
    "maestros",
];

/// Complexity level of a query, mapped to a retrieval depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    /// Short, single-topic question.
    Simple,
    /// Moderately demanding question.
    Media,
    /// Compound or analytically heavy question.
    Compleja,
    /// Manually forced exhaustive search.
    Exhaustiva,
}

impl ComplexityLevel {
    /// Stable lowercase name used in responses and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Media => "media",
            Self::Compleja => "compleja",
            Self::Exhaustiva => "exhaustiva",
        }
    }
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signals detected on the query text.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComplexityIndicators {
    /// Whitespace-separated word count.
    pub word_count: usize,
    /// More than one `?` present.
    pub multiple_questions: bool,
    /// A conjunction from the Spanish list is present.
    pub has_conjunctions: bool,
    /// An analytically demanding keyword is present.
    pub has_complex_keywords: bool,
    /// Two or more commas.
    pub has_multiple_subjects: bool,
    /// An enumeration keyword is present.
    pub asks_for_listing: bool,
}

/// Retrieval plan for one request. Disposable; built per query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryPlan {
    /// Retrieval depth.
    pub k: usize,
    /// Complexity level the depth was derived from.
    pub level: ComplexityLevel,
    /// Human-readable classification reason.
    pub reason: String,
    /// Detected signals, kept for diagnostics.
    pub indicators: ComplexityIndicators,
    /// True when lexical matching must dominate retrieval.
    pub force_lexical: bool,
    /// Supplementary per-name lookups for collective-name questions.
    pub supplementary_terms: Vec<String>,
}

/// Deterministic query classifier.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use testigo::config::EngineConfig;
/// use testigo::query::QueryClassifier;
///
/// let classifier = QueryClassifier::new(Arc::new(EngineConfig::default()));
/// let plan = classifier.classify("Alaniso", false);
/// assert!(plan.force_lexical);
/// assert_eq!(plan.k, 150);
/// ```
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    config: Arc<EngineConfig>,
}

impl QueryClassifier {
    /// Creates a classifier bound to the engine configuration.
    #[must_use]
    pub const fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    /// Classifies a query and picks its retrieval parameters.
    ///
    /// The `exhaustive` flag is a caller override: it forces the
    /// exhaustiva level regardless of the complexity score.
    #[must_use]
    pub fn classify(&self, query: &str, exhaustive: bool) -> QueryPlan {
        let lowered = query.to_lowercase();
        let indicators = detect_indicators(query, &lowered);
        let score = complexity_score(&indicators);

        let (level, k, reason) = if exhaustive {
            (
                ComplexityLevel::Exhaustiva,
                self.config.k_exhaustiva,
                "Búsqueda exhaustiva activada manualmente".to_string(),
            )
        } else if score >= 5 {
            (
                ComplexityLevel::Compleja,
                self.config.k_compleja,
                format!("Consulta compleja (puntuación {score})"),
            )
        } else if score >= 2 {
            (
                ComplexityLevel::Media,
                self.config.k_media,
                format!("Consulta media (puntuación {score})"),
            )
        } else {
            (
                ComplexityLevel::Simple,
                self.config.k_simple,
                format!("Consulta simple (puntuación {score})"),
            )
        };

        let force_lexical = self.detect_lexical_routing(query, &lowered);
        let supplementary_terms = self.supplementary_terms(&lowered);

        tracing::debug!(
            level = level.as_str(),
            k,
            score,
            force_lexical,
            supplementary = supplementary_terms.len(),
            "query classified"
        );

        QueryPlan {
            k,
            level,
            reason,
            indicators,
            force_lexical,
            supplementary_terms,
        }
    }

    /// True when the query signals an exact-string need: a capitalized
    /// word, a known name, or an identity question.
    fn detect_lexical_routing(&self, query: &str, lowered: &str) -> bool {
        let has_proper_nouns = query
            .split_whitespace()
            .filter(|w| w.chars().count() > 2)
            .any(|w| w.chars().next().is_some_and(char::is_uppercase));

        let has_name_keywords = tokenize(query)
            .iter()
            .any(|t| self.config.name_vocabulary.contains(t));

        let asks_for_names = NAME_PATTERNS.iter().any(|p| lowered.contains(p));

        has_proper_nouns || has_name_keywords || asks_for_names
    }

    /// For questions about the broad collective, every roster name
    /// becomes a supplementary sparse lookup to guarantee recall across
    /// the full named set.
    fn supplementary_terms(&self, lowered: &str) -> Vec<String> {
        let asks_for_names = NAME_PATTERNS.iter().any(|p| lowered.contains(p));
        if asks_for_names && (lowered.contains("guardianes") || lowered.contains("maestros")) {
            self.config.name_vocabulary.collective_roster.clone()
        } else {
            Vec::new()
        }
    }
}

/// Detects the raw complexity signals on a query.
fn detect_indicators(query: &str, lowered: &str) -> ComplexityIndicators {
    let tokens = tokenize(query);
    let contains_keyword = |keyword: &&str| {
        if keyword.contains(' ') {
            lowered.contains(*keyword)
        } else {
            tokens.iter().any(|t| t == keyword)
        }
    };

    ComplexityIndicators {
        word_count: query.split_whitespace().count(),
        multiple_questions: query.matches('?').count() > 1,
        has_conjunctions: CONJUNCTIONS.iter().any(contains_keyword),
        has_complex_keywords: COMPLEX_KEYWORDS.iter().any(|kw| lowered.contains(kw)),
        has_multiple_subjects: query.matches(',').count() >= 2,
        asks_for_listing: LISTING_KEYWORDS.iter().any(contains_keyword),
    }
}

/// Maps indicators to the deterministic complexity score.
const fn complexity_score(ind: &ComplexityIndicators) -> u32 {
    let mut score = 0;
    if ind.word_count > 40 {
        score += 3;
    } else if ind.word_count > 25 {
        score += 2;
    } else if ind.word_count > 15 {
        score += 1;
    }
    if ind.multiple_questions {
        score += 2;
    }
    if ind.has_complex_keywords {
        score += 2;
    }
    if ind.asks_for_listing {
        score += 2;
    }
    if ind.has_conjunctions {
        score += 1;
    }
    if ind.has_multiple_subjects {
        score += 1;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn classifier() -> QueryClassifier {
        QueryClassifier::new(Arc::new(EngineConfig::default()))
    }

    #[test]
    fn test_simple_question_stays_hybrid() {
        let plan = classifier().classify("¿Qué enseñó el maestro sobre el amor?", false);
        assert_eq!(plan.level, ComplexityLevel::Simple);
        assert_eq!(plan.k, 150);
        // Only the plural identity forms route lexically; "maestro" does not.
        assert!(!plan.force_lexical);
        assert!(plan.supplementary_terms.is_empty());
    }

    #[test]
    fn test_collective_names_question() {
        let plan = classifier().classify("¿Cuáles son los nombres de los nueve guardianes?", false);
        assert!(plan.indicators.asks_for_listing);
        assert!(plan.force_lexical);
        assert_eq!(plan.supplementary_terms.len(), 9);
        assert!(plan.supplementary_terms.contains(&"aviatar".to_string()));
    }

    #[test]
    fn test_single_capitalized_name() {
        let plan = classifier().classify("Alaniso", false);
        assert!(plan.force_lexical);
        assert_eq!(plan.level, ComplexityLevel::Simple);
        assert_eq!(plan.k, 150);
        assert!(plan.supplementary_terms.is_empty());
    }

    #[test]
    fn test_complex_compound_question() {
        let query = "compara y contrasta las enseñanzas de Azoes y Aviatar sobre la \
                     meditación, detalladamente, en todos los pasajes relevantes";
        let plan = classifier().classify(query, false);
        // compara/todos los (+2), listing no, conjunción y (+1),
        // dos comas (+1), 18 palabras (+1): total >= 5.
        assert_eq!(plan.level, ComplexityLevel::Compleja);
        assert_eq!(plan.k, 180);
        assert!(plan.force_lexical);
    }

    #[test]
    fn test_exhaustive_override() {
        let plan = classifier().classify("cualquier pregunta", true);
        assert_eq!(plan.level, ComplexityLevel::Exhaustiva);
        assert_eq!(plan.k, 200);
        assert_eq!(plan.reason, "Búsqueda exhaustiva activada manualmente");
    }

    #[test]
    fn test_empty_query_is_simple() {
        let plan = classifier().classify("", false);
        assert_eq!(plan.level, ComplexityLevel::Simple);
        assert_eq!(plan.k, 150);
        assert!(!plan.force_lexical);
    }

    #[test]
    fn test_long_listing_double_question() {
        // > 40 words (+3), two '?' (+2), listing keyword (+2): compleja.
        let padding = "de la palabra ".repeat(14);
        let query = format!("enumera {padding} los temas? y los lugares?");
        let plan = classifier().classify(&query, false);
        assert!(plan.indicators.word_count > 40);
        assert!(plan.indicators.multiple_questions);
        assert!(plan.indicators.asks_for_listing);
        assert_eq!(plan.level, ComplexityLevel::Compleja);
        assert_eq!(plan.k, 180);
    }

    #[test_case("dónde ocurrió aquello que nos relató el narrador principal durante la primera parte de toda la serie", 1 ; "seventeen words")]
    #[test_case("explica eso", 0 ; "two words")]
    fn test_word_count_tiers(query: &str, expected: u32) {
        let plan = classifier().classify(query, false);
        let score = complexity_score(&plan.indicators);
        assert_eq!(score, expected);
    }

    #[test]
    fn test_media_level_from_two_points() {
        // "también" (+1) and two commas (+1) with no other signals.
        let plan = classifier().classify("dime también esto, aquello, eso", false);
        assert!(plan.indicators.has_conjunctions);
        assert!(plan.indicators.has_multiple_subjects);
        assert_eq!(plan.level, ComplexityLevel::Media);
        assert_eq!(plan.k, 165);
    }

    #[test]
    fn test_conjunction_y_matches_token_not_substring() {
        // "ayer" contains 'y' but is not the conjunction.
        let plan = classifier().classify("ayer pasó algo", false);
        assert!(!plan.indicators.has_conjunctions);

        let plan = classifier().classify("el amor y la paz", false);
        assert!(plan.indicators.has_conjunctions);
    }

    #[test]
    fn test_lowercase_vocabulary_name_routes_lexically() {
        let plan = classifier().classify("háblame de azoes", false);
        assert!(plan.force_lexical);
    }

    #[test]
    fn test_plain_lowercase_query_not_lexical() {
        let plan = classifier().classify("el amor lo puede todo", false);
        assert!(!plan.force_lexical);
    }

    #[test]
    fn test_maestros_collective_triggers_supplements() {
        let plan = classifier().classify("¿quienes son los maestros?", false);
        assert_eq!(plan.supplementary_terms.len(), 9);
    }

    #[test]
    fn test_determinism() {
        let c = classifier();
        let a = c.classify("¿Quién acompañó a Aviatar?", false);
        let b = c.classify("¿Quién acompañó a Aviatar?", false);
        assert_eq!(a.k, b.k);
        assert_eq!(a.level, b.level);
        assert_eq!(a.force_lexical, b.force_lexical);
        assert_eq!(a.reason, b.reason);
    }
}
