//! Error types and retry classification for rate resolution.
//!
//! This module provides:
//! - [`RateError`]: The main error enum for all rate and conversion operations
//! - [`RetryClass`]: Classification for determining retry behavior
//! - [`ProviderFailure`]: Per-provider summary carried by terminal errors

mod retry;

pub use retry::RetryClass;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The last error a provider returned during a cascade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: String,
}

/// Errors that can occur while resolving rates or converting amounts.
///
/// Each variant is classified into a [`RetryClass`] via
/// [`retry_class`](Self::retry_class), which drives the orchestrator.
#[derive(Error, Debug)]
pub enum RateError {
    /// Bad amount or currency code. Fails fast without any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single provider failed transiently (5xx, connection refused).
    #[error("Provider unavailable: {provider} - {message}")]
    ProviderUnavailable {
        provider: String,
        message: String,
    },

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// Missing or invalid credential, or authorization failure.
    #[error("Provider rejected request: {provider} - {message}")]
    ProviderRejected {
        provider: String,
        message: String,
    },

    /// The provider does not quote this currency pair.
    #[error("Unsupported pair {pair} for provider {provider}")]
    UnsupportedPair { provider: String, pair: String },

    /// The provider returned a rate that failed validation.
    #[error("Invalid rate from {provider}: {message}")]
    InvalidRate { provider: String, message: String },

    /// Every provider failed and no offline rate was available.
    #[error("All providers exhausted for {pair}")]
    AllProvidersExhausted {
        pair: String,
        /// Last error per provider, in the order they were tried.
        attempts: Vec<ProviderFailure>,
    },

    /// A persisted cache blob could not be decoded.
    #[error("Cache corrupt: {0}")]
    CacheCorrupt(String),

    /// The key-value store collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl RateError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use fxlens_rates::errors::{RateError, RetryClass};
    ///
    /// let error = RateError::Timeout { provider: "FRANKFURTER".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = RateError::ProviderRejected {
    ///     provider: "EXCHANGE_RATE_API".to_string(),
    ///     message: "missing credential".to_string(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::ProviderUnavailable { .. }
            | Self::RateLimited { .. }
            | Self::Timeout { .. }
            | Self::Network(_) => RetryClass::WithBackoff,

            Self::ProviderRejected { .. }
            | Self::UnsupportedPair { .. }
            | Self::InvalidRate { .. } => RetryClass::NextProvider,

            Self::InvalidInput(_)
            | Self::AllProvidersExhausted { .. }
            | Self::CacheCorrupt(_)
            | Self::Storage(_) => RetryClass::Never,
        }
    }

    /// Whether the error may clear up if the same call is repeated.
    pub fn is_retryable(&self) -> bool {
        self.retry_class() == RetryClass::WithBackoff
    }

    /// The provider this error originated from, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::ProviderUnavailable { provider, .. }
            | Self::RateLimited { provider }
            | Self::Timeout { provider }
            | Self::ProviderRejected { provider, .. }
            | Self::UnsupportedPair { provider, .. }
            | Self::InvalidRate { provider, .. } => Some(provider),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RateError {
    fn from(e: serde_json::Error) -> Self {
        Self::CacheCorrupt(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_retry_with_backoff() {
        let errors = [
            RateError::ProviderUnavailable {
                provider: "FRANKFURTER".to_string(),
                message: "HTTP 503".to_string(),
            },
            RateError::RateLimited {
                provider: "FRANKFURTER".to_string(),
            },
            RateError::Timeout {
                provider: "COINGECKO".to_string(),
            },
        ];
        for error in errors {
            assert_eq!(error.retry_class(), RetryClass::WithBackoff, "{error}");
            assert!(error.is_retryable());
        }
    }

    #[test]
    fn test_rejections_skip_to_next_provider() {
        let errors = [
            RateError::ProviderRejected {
                provider: "EXCHANGE_RATE_API".to_string(),
                message: "Invalid API key".to_string(),
            },
            RateError::UnsupportedPair {
                provider: "FRANKFURTER".to_string(),
                pair: "BTC/USD".to_string(),
            },
            RateError::InvalidRate {
                provider: "OPEN_EXCHANGE_RATES".to_string(),
                message: "zero".to_string(),
            },
        ];
        for error in errors {
            assert_eq!(error.retry_class(), RetryClass::NextProvider, "{error}");
            assert!(!error.is_retryable());
        }
    }

    #[test]
    fn test_terminal_errors_never_retry() {
        assert_eq!(
            RateError::InvalidInput("amount must be positive".to_string()).retry_class(),
            RetryClass::Never
        );
        assert_eq!(
            RateError::AllProvidersExhausted {
                pair: "EUR/USD".to_string(),
                attempts: Vec::new(),
            }
            .retry_class(),
            RetryClass::Never
        );
        assert_eq!(
            RateError::CacheCorrupt("bad json".to_string()).retry_class(),
            RetryClass::Never
        );
    }

    #[test]
    fn test_provider_accessor() {
        let error = RateError::Timeout {
            provider: "COINGECKO".to_string(),
        };
        assert_eq!(error.provider(), Some("COINGECKO"));
        assert_eq!(RateError::Storage("disk full".to_string()).provider(), None);
    }

    #[test]
    fn test_error_display() {
        let error = RateError::UnsupportedPair {
            provider: "FRANKFURTER".to_string(),
            pair: "BTC/USD".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unsupported pair BTC/USD for provider FRANKFURTER"
        );

        let error = RateError::AllProvidersExhausted {
            pair: "EUR/JPY".to_string(),
            attempts: vec![ProviderFailure {
                provider: "FRANKFURTER".to_string(),
                error: "Timeout: FRANKFURTER".to_string(),
            }],
        };
        assert_eq!(error.to_string(), "All providers exhausted for EUR/JPY");
    }
}
