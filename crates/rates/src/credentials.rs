//! Credential lookup collaborator.
//!
//! Providers that need an API key ask a [`CredentialLookup`] for it on every
//! call. Nothing in this crate stores credentials.

use std::collections::HashMap;

/// Resolves the API key for a provider by name.
pub trait CredentialLookup: Send + Sync {
    /// The credential for `provider`, or `None` when not configured.
    fn get_credential(&self, provider: &str) -> Option<String>;
}

/// Reads `FXLENS_<PROVIDER>_API_KEY` from the environment.
///
/// `EXCHANGE_RATE_API` is looked up as `FXLENS_EXCHANGE_RATE_API_API_KEY`.
/// Empty values count as missing.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvCredentialLookup;

impl EnvCredentialLookup {
    pub fn variable_name(provider: &str) -> String {
        format!("FXLENS_{}_API_KEY", provider.to_uppercase())
    }
}

impl CredentialLookup for EnvCredentialLookup {
    fn get_credential(&self, provider: &str) -> Option<String> {
        std::env::var(Self::variable_name(provider))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Fixed in-memory credentials.
#[derive(Clone, Debug, Default)]
pub struct StaticCredentials {
    keys: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl Into<String>, key: impl Into<String>) -> Self {
        self.keys.insert(provider.into(), key.into());
        self
    }
}

impl CredentialLookup for StaticCredentials {
    fn get_credential(&self, provider: &str) -> Option<String> {
        self.keys.get(provider).filter(|k| !k.is_empty()).cloned()
    }
}
