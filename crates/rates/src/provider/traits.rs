//! Rate provider trait definition.

use async_trait::async_trait;

use crate::errors::RateError;
use crate::models::{CurrencyPair, RateRecord};

use super::descriptor::ProviderDescriptor;

/// Trait for exchange rate providers.
///
/// The orchestrator only depends on this capability. Providers are tried in
/// ascending [`priority`](Self::priority) order, and a provider that does not
/// [`support`](Self::supports) a pair is skipped without a network call.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use fxlens_rates::provider::{ProviderDescriptor, RateProvider};
///
/// struct FixedProvider;
///
/// #[async_trait]
/// impl RateProvider for FixedProvider {
///     fn descriptor(&self) -> ProviderDescriptor {
///         ProviderDescriptor {
///             name: "FIXED",
///             base_endpoint: "memory://",
///             priority: 50,
///             requires_credential: false,
///         }
///     }
///
///     async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<RateRecord, RateError> {
///         Ok(RateRecord::new(pair, Decimal::ONE, "FIXED", Utc::now()))
///     }
/// }
/// ```
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Static configuration for this provider.
    fn descriptor(&self) -> ProviderDescriptor;

    /// Unique identifier, used in logs, diagnostics and `RateRecord::source`.
    fn id(&self) -> &'static str {
        self.descriptor().name
    }

    /// Lower values are tried first.
    fn priority(&self) -> u8 {
        self.descriptor().priority
    }

    /// Whether this provider can quote `pair` at all.
    fn supports(&self, _pair: &CurrencyPair) -> bool {
        true
    }

    /// Fetch the current rate for `pair` (1 `pair.from` = rate `pair.to`).
    async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<RateRecord, RateError>;
}
