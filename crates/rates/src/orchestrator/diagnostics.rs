//! Per-call diagnostics for the provider cascade.

use serde::Serialize;

use crate::errors::ProviderFailure;

/// Why a provider was not called.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum SkipReason {
    /// The provider does not quote one of the currencies.
    UnsupportedPair,
    /// The overall cascade timeout elapsed before this provider's turn.
    CascadeTimeout,
}

/// One provider's part in a cascade.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAttempt {
    pub provider: String,
    pub skipped: Option<SkipReason>,
    pub error: Option<String>,
    /// Retries spent on this provider after its first attempt.
    pub retries: u32,
    pub success: bool,
}

/// What happened while resolving one rate.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
    pub cache_hit: bool,
    pub offline_fallback: bool,
    pub throttled: bool,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, provider: &str, reason: SkipReason) {
        self.attempts.push(ProviderAttempt {
            provider: provider.to_string(),
            skipped: Some(reason),
            error: None,
            retries: 0,
            success: false,
        });
    }

    pub fn record_error(&mut self, provider: &str, error: String, retries: u32) {
        self.attempts.push(ProviderAttempt {
            provider: provider.to_string(),
            skipped: None,
            error: Some(error),
            retries,
            success: false,
        });
    }

    pub fn record_success(&mut self, provider: &str, retries: u32) {
        self.attempts.push(ProviderAttempt {
            provider: provider.to_string(),
            skipped: None,
            error: None,
            retries,
            success: true,
        });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        if self.cache_hit {
            return "CACHE: HIT".to_string();
        }
        let mut parts: Vec<String> = self
            .attempts
            .iter()
            .map(|a| {
                if a.success {
                    format!("{}: SUCCESS (retries={})", a.provider, a.retries)
                } else if let Some(skip) = &a.skipped {
                    format!("{}: SKIPPED ({:?})", a.provider, skip)
                } else if let Some(err) = &a.error {
                    format!("{}: ERROR ({}, retries={})", a.provider, err, a.retries)
                } else {
                    format!("{}: UNKNOWN", a.provider)
                }
            })
            .collect();
        if self.offline_fallback {
            parts.push("OFFLINE: HIT".to_string());
        }
        parts.join(" -> ")
    }

    /// Check if any provider succeeded.
    pub fn has_success(&self) -> bool {
        self.attempts.iter().any(|a| a.success)
    }

    /// Retries across every provider.
    pub fn total_retries(&self) -> u32 {
        self.attempts.iter().map(|a| a.retries).sum()
    }

    /// Last error per provider that was actually called, in cascade order.
    pub fn failures(&self) -> Vec<ProviderFailure> {
        self.attempts
            .iter()
            .filter_map(|a| {
                a.error.as_ref().map(|e| ProviderFailure {
                    provider: a.provider.clone(),
                    error: e.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = FetchDiagnostics::new();
        diag.record_skip("FRANKFURTER", SkipReason::UnsupportedPair);
        diag.record_error("EXCHANGE_RATE_API", "Timeout".to_string(), 3);
        diag.record_success("COINGECKO", 1);

        let summary = diag.summary();
        assert!(summary.contains("FRANKFURTER: SKIPPED"));
        assert!(summary.contains("EXCHANGE_RATE_API: ERROR (Timeout, retries=3)"));
        assert!(summary.contains("COINGECKO: SUCCESS"));
        assert_eq!(diag.total_retries(), 4);
        assert!(diag.has_success());
    }

    #[test]
    fn test_failures_skip_skipped_providers() {
        let mut diag = FetchDiagnostics::new();
        diag.record_skip("FRANKFURTER", SkipReason::UnsupportedPair);
        diag.record_error("COINGECKO", "HTTP 503".to_string(), 3);
        diag.offline_fallback = true;

        let failures = diag.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].provider, "COINGECKO");
        assert!(!diag.has_success());
        assert!(diag.summary().ends_with("OFFLINE: HIT"));
    }

    #[test]
    fn test_cache_hit_summary() {
        let diag = FetchDiagnostics {
            cache_hit: true,
            ..FetchDiagnostics::default()
        };
        assert_eq!(diag.summary(), "CACHE: HIT");
    }
}
