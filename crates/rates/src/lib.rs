//! Resilient exchange rate resolution and currency conversion.
//!
//! ```text
//!                 ConversionEngine
//!                        │
//!               ProviderOrchestrator ──── RequestThrottle
//!                  │           │
//!     RateCache (fresh)   providers by priority (retry + backoff)
//!                              │
//!                     RateCache (offline) ── AllProvidersExhausted
//! ```
//!
//! Durable storage and credentials are collaborators supplied by the
//! caller through [`KeyValueStore`] and [`CredentialLookup`].

pub mod cache;
pub mod clock;
pub mod conversion;
pub mod credentials;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod provider;
pub mod store;

pub use cache::{CacheConfig, CacheStats, CacheTier, RateCache, CACHE_STORAGE_KEY};
pub use clock::{Clock, ManualClock, SystemClock};
pub use conversion::{precision_for, ConversionEngine};
pub use credentials::{CredentialLookup, EnvCredentialLookup, StaticCredentials};
pub use errors::{ProviderFailure, RateError, RetryClass};
pub use models::{ConversionRequest, ConversionResult, CurrencyPair, RateRecord};
pub use orchestrator::{
    FetchDiagnostics, OrchestratorConfig, ProviderOrchestrator, RequestThrottle, RetryPolicy,
    ThrottleConfig,
};
pub use provider::{default_providers, ProviderDescriptor, RateProvider};
pub use store::{KeyValueStore, MemoryStore};
