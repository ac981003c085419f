//! Credentials for external model services.
//!
//! A [`CredentialsProvider`] is injected at construction instead of
//! letting modules mutate process-wide environment state. Implementations
//! decide where the key actually lives.

use crate::error::{Error, Result};

/// Source of API credentials for the embedding and generation services.
pub trait CredentialsProvider: Send + Sync {
    /// Returns the API key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no key is available.
    fn api_key(&self) -> Result<String>;

    /// Optional API base URL override (for self-hosted endpoints).
    fn api_base(&self) -> Option<String>;
}

/// Credentials held directly in memory.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    key: String,
    base: Option<String>,
}

impl StaticCredentials {
    /// Creates a provider from a literal key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            base: None,
        }
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }
}

impl CredentialsProvider for StaticCredentials {
    fn api_key(&self) -> Result<String> {
        Ok(self.key.clone())
    }

    fn api_base(&self) -> Option<String> {
        self.base.clone()
    }
}

/// Credentials read from named environment variables at call time.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    key_var: String,
    base_var: String,
}

impl EnvCredentials {
    /// Creates a provider reading the given variable names.
    #[must_use]
    pub fn new(key_var: impl Into<String>, base_var: impl Into<String>) -> Self {
        Self {
            key_var: key_var.into(),
            base_var: base_var.into(),
        }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new("TESTIGO_API_KEY", "TESTIGO_API_BASE")
    }
}

impl CredentialsProvider for EnvCredentials {
    fn api_key(&self) -> Result<String> {
        std::env::var(&self.key_var).map_err(|_| Error::Config {
            message: format!("missing credentials: set {}", self.key_var),
        })
    }

    fn api_base(&self) -> Option<String> {
        std::env::var(&self.base_var).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_credentials() {
        let creds = StaticCredentials::new("sk-test").with_base("http://localhost:8080/v1");
        assert_eq!(creds.api_key().unwrap(), "sk-test");
        assert_eq!(creds.api_base().as_deref(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn test_static_credentials_without_base() {
        let creds = StaticCredentials::new("sk-test");
        assert!(creds.api_base().is_none());
    }

    #[test]
    fn test_env_credentials_missing_key() {
        let creds = EnvCredentials::new("TESTIGO_TEST_UNSET_KEY", "TESTIGO_TEST_UNSET_BASE");
        let err = creds.api_key().unwrap_err();
        assert!(err.to_string().contains("TESTIGO_TEST_UNSET_KEY"));
        assert!(creds.api_base().is_none());
    }
}
