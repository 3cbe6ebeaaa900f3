//! Error types for the oracle transport boundary and configuration loading.
//!
//! Transport failures are tagged so the retry layer can dispatch on the
//! variant instead of inspecting error messages:
//!
//! | Variant | Source | Retried |
//! |---------|--------|---------|
//! | [`OracleError::Throttled`] | HTTP 429 | yes, with backoff |
//! | [`OracleError::Transient`] | 5xx, connection failures | no |
//! | [`OracleError::Timeout`] | per-call timeout expired | no |
//! | [`OracleError::Fatal`] | auth, bad request, malformed envelope | no |

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Outcome tag for a failed oracle call.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The service asked us to slow down.
    #[error("oracle throttled the request: {0}")]
    Throttled(String),

    /// The service or network failed in a way that might clear up later,
    /// but not within the latency budget of a single article.
    #[error("transient oracle failure: {0}")]
    Transient(String),

    /// The call did not finish within the configured per-call timeout.
    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),

    /// Retrying cannot help (authentication, malformed request or response).
    #[error("fatal oracle failure: {0}")]
    Fatal(String),
}

impl OracleError {
    /// Only throttling is worth waiting out.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OracleError::Throttled(_))
    }
}

/// Errors raised while loading or validating the YAML configuration.
///
/// Any of these aborts the run before a single article is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_throttled_is_retryable() {
        assert!(OracleError::Throttled("429".into()).is_retryable());
        assert!(!OracleError::Transient("503".into()).is_retryable());
        assert!(!OracleError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!OracleError::Fatal("401".into()).is_retryable());
    }

    #[test]
    fn test_config_error_display() {
        let e = ConfigError::Invalid("taxonomy.regions is empty".into());
        assert_eq!(
            e.to_string(),
            "invalid configuration: taxonomy.regions is empty"
        );
    }
}
