//! Engine configuration.
//!
//! All tunables live in one immutable [`EngineConfig`] value built at
//! startup and passed explicitly at construction. Nothing in the request
//! path reads environment variables or mutable globals.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;

/// RRF rank-smoothing constant from the original fusion paper.
pub const DEFAULT_RRF_CONSTANT: f64 = 60.0;

/// Hard ceiling on the candidate pool size (`k * 4` must stay below this).
pub const MAX_CANDIDATES: usize = 800;

/// Retrieval depths per complexity level.
const DEFAULT_K_SIMPLE: usize = 150;
const DEFAULT_K_MEDIA: usize = 165;
const DEFAULT_K_COMPLEJA: usize = 180;
const DEFAULT_K_EXHAUSTIVA: usize = 200;

/// Closed vocabulary of corpus-specific names and identity words.
///
/// Deployment data, not engine logic: the defaults match the subtitle
/// corpus this engine ships against, and every list can be replaced per
/// deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameVocabulary {
    /// Identity question words ("nombre", "quien", ...). Lowercase.
    pub identity_keywords: Vec<String>,
    /// Proper names known to appear in the corpus. Lowercase.
    pub proper_names: Vec<String>,
    /// Roster used for collective-name queries ("guardianes"/"maestros"):
    /// each entry becomes a supplementary sparse lookup.
    pub collective_roster: Vec<String>,
    /// Sparse hits unioned into the pool per roster name.
    pub per_name_depth: usize,
}

impl Default for NameVocabulary {
    fn default() -> Self {
        let to_owned = |words: &[&str]| words.iter().map(ToString::to_string).collect();
        Self {
            identity_keywords: to_owned(&[
                "nombre",
                "nombres",
                "quien",
                "quienes",
                "guardianes",
                "maestros",
            ]),
            proper_names: to_owned(&[
                "maria",
                "magdalena",
                "jesus",
                "cristo",
                "jose",
                "juan",
                "pedro",
                "pablo",
                "azoes",
                "azen",
                "aviatar",
                "alaniso",
                "alan",
                "axel",
                "adiestro",
                "adiel",
                "aladim",
                "aliestro",
                "trey",
                "totero",
                "ra",
                "thor",
                "arcangel",
            ]),
            collective_roster: to_owned(&[
                "alaniso",
                "axel",
                "alan",
                "azen",
                "aviatar",
                "aladim",
                "adiel",
                "azoes",
                "aliestro",
            ]),
            per_name_depth: 30,
        }
    }
}

impl NameVocabulary {
    /// Returns true if the lowercase token is a known name or identity word.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.identity_keywords.iter().any(|w| w == token)
            || self.proper_names.iter().any(|w| w == token)
    }
}

/// Immutable engine configuration.
///
/// # Examples
///
/// ```
/// use testigo::config::EngineConfig;
///
/// let config = EngineConfig::new()
///     .with_chunking(1000, 200)
///     .with_alpha(0.8);
/// assert_eq!(config.chunk_size, 1000);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, measured in whole blocks.
    pub chunk_overlap: usize,
    /// Retrieval depth for simple queries.
    pub k_simple: usize,
    /// Retrieval depth for medium queries.
    pub k_media: usize,
    /// Retrieval depth for complex queries.
    pub k_compleja: usize,
    /// Retrieval depth for manually-forced exhaustive queries.
    pub k_exhaustiva: usize,
    /// Dense weight in rank fusion (semantic share).
    pub alpha_default: f64,
    /// Dense weight under force-lexical routing.
    pub alpha_lexical: f64,
    /// RRF rank-smoothing constant.
    pub rrf_constant: f64,
    /// Corpus-specific names and identity words.
    pub name_vocabulary: NameVocabulary,
    /// Deadline for a single embedding call.
    pub embedding_timeout: Duration,
    /// Deadline for a single generation call.
    pub generation_timeout: Duration,
    /// End-to-end deadline for one request.
    pub total_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            k_simple: DEFAULT_K_SIMPLE,
            k_media: DEFAULT_K_MEDIA,
            k_compleja: DEFAULT_K_COMPLEJA,
            k_exhaustiva: DEFAULT_K_EXHAUSTIVA,
            alpha_default: 0.7,
            alpha_lexical: 0.05,
            rrf_constant: DEFAULT_RRF_CONSTANT,
            name_vocabulary: NameVocabulary::default(),
            embedding_timeout: Duration::from_secs(20),
            generation_timeout: Duration::from_secs(120),
            total_timeout: Duration::from_secs(180),
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets chunk size and overlap.
    #[must_use]
    pub const fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Sets the default dense weight for rank fusion.
    #[must_use]
    pub const fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha_default = alpha;
        self
    }

    /// Sets the retrieval depths for the four complexity levels.
    #[must_use]
    pub const fn with_depths(
        mut self,
        simple: usize,
        media: usize,
        compleja: usize,
        exhaustiva: usize,
    ) -> Self {
        self.k_simple = simple;
        self.k_media = media;
        self.k_compleja = compleja;
        self.k_exhaustiva = exhaustiva;
        self
    }

    /// Replaces the name vocabulary.
    #[must_use]
    pub fn with_name_vocabulary(mut self, vocabulary: NameVocabulary) -> Self {
        self.name_vocabulary = vocabulary;
        self
    }

    /// Sets the per-stage deadlines.
    #[must_use]
    pub const fn with_timeouts(
        mut self,
        embedding: Duration,
        generation: Duration,
        total: Duration,
    ) -> Self {
        self.embedding_timeout = embedding;
        self.generation_timeout = generation;
        self.total_timeout = total;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when overlap is not smaller than the
    /// chunk size, a fusion weight falls outside `[0, 1]`, or the
    /// exhaustive depth would overflow the candidate ceiling.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config {
                message: "chunk_size must be > 0".to_string(),
            });
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config {
                message: format!(
                    "chunk_overlap {} must be less than chunk_size {}",
                    self.chunk_overlap, self.chunk_size
                ),
            });
        }
        for (name, alpha) in [
            ("alpha_default", self.alpha_default),
            ("alpha_lexical", self.alpha_lexical),
        ] {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(Error::Config {
                    message: format!("{name} must be within [0, 1], got {alpha}"),
                });
            }
        }
        let max_k = self
            .k_simple
            .max(self.k_media)
            .max(self.k_compleja)
            .max(self.k_exhaustiva);
        if max_k == 0 {
            return Err(Error::Config {
                message: "retrieval depths must be > 0".to_string(),
            });
        }
        if max_k * 4 > MAX_CANDIDATES {
            return Err(Error::Config {
                message: format!(
                    "retrieval depth {max_k} exceeds candidate ceiling ({MAX_CANDIDATES} / 4)"
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.chunk_size, 800);
        assert_eq!(config.chunk_overlap, 150);
        assert_eq!(config.k_simple, 150);
        assert_eq!(config.k_media, 165);
        assert_eq!(config.k_compleja, 180);
        assert_eq!(config.k_exhaustiva, 200);
        assert!((config.alpha_default - 0.7).abs() < f64::EPSILON);
        assert!((config.alpha_lexical - 0.05).abs() < f64::EPSILON);
        assert!((config.rrf_constant - 60.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::new()
            .with_chunking(1000, 100)
            .with_alpha(0.5)
            .with_depths(10, 20, 30, 40)
            .with_timeouts(
                Duration::from_secs(5),
                Duration::from_secs(30),
                Duration::from_secs(60),
            );
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.k_exhaustiva, 40);
        assert!((config.alpha_default - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_overlap_too_large() {
        let config = EngineConfig::new().with_chunking(100, 100);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_alpha_out_of_range() {
        let config = EngineConfig::new().with_alpha(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_depth_ceiling() {
        // 250 * 4 = 1000 > 800
        let config = EngineConfig::new().with_depths(150, 165, 180, 250);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_vocabulary_contains() {
        let vocab = NameVocabulary::default();
        assert!(vocab.contains("alaniso"));
        assert!(vocab.contains("quien"));
        assert!(vocab.contains("guardianes"));
        assert!(!vocab.contains("zanahoria"));
    }

    #[test]
    fn test_roster_has_nine_names() {
        let vocab = NameVocabulary::default();
        assert_eq!(vocab.collective_roster.len(), 9);
    }
}
