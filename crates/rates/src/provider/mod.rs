//! Exchange rate provider abstractions and implementations.
//!
//! This module contains:
//! - The `RateProvider` trait that all providers implement
//! - The static provider table (`ProviderDescriptor`)
//! - Concrete providers: Frankfurter, ExchangeRate-API, Open Exchange
//!   Rates and CoinGecko
//!
//! Providers that need an API key receive a `CredentialLookup` and ask it
//! for the key on every call. A missing key is a `ProviderRejected` error,
//! so the orchestrator moves on without retrying.

mod descriptor;
mod http;
mod traits;

pub mod coingecko;
pub mod exchange_rate_api;
pub mod frankfurter;
pub mod open_exchange_rates;

use std::sync::Arc;

use log::debug;

use crate::credentials::CredentialLookup;

pub use descriptor::{ProviderDescriptor, PROVIDER_TABLE};
pub use traits::RateProvider;

pub use coingecko::CoinGeckoProvider;
pub use exchange_rate_api::ExchangeRateApiProvider;
pub use frankfurter::FrankfurterProvider;
pub use open_exchange_rates::OpenExchangeRatesProvider;

/// Build every built-in provider.
///
/// Credentialed providers whose key is not configured right now are left
/// out, so a default setup only calls the keyless ones.
pub fn default_providers(credentials: Arc<dyn CredentialLookup>) -> Vec<Arc<dyn RateProvider>> {
    let mut providers: Vec<Arc<dyn RateProvider>> = vec![Arc::new(FrankfurterProvider::new())];

    if credentials
        .get_credential(exchange_rate_api::DESCRIPTOR.name)
        .is_some()
    {
        providers.push(Arc::new(ExchangeRateApiProvider::new(credentials.clone())));
    } else {
        debug!(
            "Provider '{}' requires API key but none found, skipping",
            exchange_rate_api::DESCRIPTOR.name
        );
    }

    if credentials
        .get_credential(open_exchange_rates::DESCRIPTOR.name)
        .is_some()
    {
        providers.push(Arc::new(OpenExchangeRatesProvider::new(credentials.clone())));
    } else {
        debug!(
            "Provider '{}' requires API key but none found, skipping",
            open_exchange_rates::DESCRIPTOR.name
        );
    }

    providers.push(Arc::new(CoinGeckoProvider::new()));
    providers
}
