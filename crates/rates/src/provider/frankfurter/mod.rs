//! Frankfurter exchange rate provider.
//!
//! Serves the European Central Bank reference rates, published once per
//! working day. No API key is required.
//! API documentation: https://www.frankfurter.app/docs/

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::RateError;
use crate::models::{CurrencyPair, RateRecord};
use crate::provider::http::{build_client, get_text, parse_json, to_decimal};
use crate::provider::{ProviderDescriptor, RateProvider};

const PROVIDER_ID: &str = "FRANKFURTER";

pub const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    name: PROVIDER_ID,
    base_endpoint: "https://api.frankfurter.app",
    priority: 1,
    requires_credential: false,
};

/// Currencies in the ECB reference rate set.
const SUPPORTED_CURRENCIES: &[&str] = &[
    "AUD", "BGN", "BRL", "CAD", "CHF", "CNY", "CZK", "DKK", "EUR", "GBP", "HKD", "HUF", "IDR",
    "ILS", "INR", "ISK", "JPY", "KRW", "MXN", "MYR", "NOK", "NZD", "PHP", "PLN", "RON", "SEK",
    "SGD", "THB", "TRY", "USD", "ZAR",
];

/// Response from /latest
#[derive(Debug, Deserialize)]
struct LatestResponse {
    rates: HashMap<String, f64>,
}

pub struct FrankfurterProvider {
    client: Client,
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        Self {
            client: build_client(),
            base_url: DESCRIPTOR.base_endpoint.to_string(),
        }
    }

    /// Point the provider at a mirror of the public API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_latest(body: &str, pair: &CurrencyPair) -> Result<RateRecord, RateError> {
    let response: LatestResponse = parse_json(PROVIDER_ID, body)?;
    let rate = response
        .rates
        .get(&pair.to)
        .ok_or_else(|| RateError::UnsupportedPair {
            provider: PROVIDER_ID.to_string(),
            pair: pair.to_string(),
        })?;
    Ok(RateRecord::new(
        pair,
        to_decimal(PROVIDER_ID, *rate)?,
        PROVIDER_ID,
        Utc::now(),
    ))
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    fn descriptor(&self) -> ProviderDescriptor {
        DESCRIPTOR
    }

    fn supports(&self, pair: &CurrencyPair) -> bool {
        SUPPORTED_CURRENCIES.contains(&pair.from.as_str())
            && SUPPORTED_CURRENCIES.contains(&pair.to.as_str())
    }

    async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<RateRecord, RateError> {
        let url = format!("{}/latest", self.base_url);
        let query = [("from", pair.from.as_str()), ("to", pair.to.as_str())];
        let body = get_text(&self.client, PROVIDER_ID, &url, &query, pair).await?;
        parse_latest(&body, pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_provider_descriptor() {
        let provider = FrankfurterProvider::new();
        assert_eq!(provider.id(), "FRANKFURTER");
        assert_eq!(provider.priority(), 1);
        assert!(!provider.descriptor().requires_credential);
    }

    #[test]
    fn test_supports_ecb_currencies_only() {
        let provider = FrankfurterProvider::new();
        assert!(provider.supports(&CurrencyPair::new("EUR", "USD")));
        assert!(provider.supports(&CurrencyPair::new("GBP", "JPY")));
        assert!(!provider.supports(&CurrencyPair::new("BTC", "USD")));
        assert!(!provider.supports(&CurrencyPair::new("USD", "NGN")));
    }

    #[test]
    fn test_parse_latest() {
        let body = r#"{"amount":1.0,"base":"EUR","date":"2024-03-01","rates":{"USD":1.085}}"#;
        let pair = CurrencyPair::new("EUR", "USD");
        let record = parse_latest(body, &pair).unwrap();
        assert_eq!(record.rate, dec!(1.085));
        assert_eq!(record.source, "FRANKFURTER");
        assert_eq!(record.pair(), pair);
        assert!(!record.cached);
    }

    #[test]
    fn test_parse_latest_missing_target() {
        let body = r#"{"amount":1.0,"base":"EUR","date":"2024-03-01","rates":{}}"#;
        let err = parse_latest(body, &CurrencyPair::new("EUR", "USD")).unwrap_err();
        assert!(matches!(err, RateError::UnsupportedPair { .. }));
    }
}
