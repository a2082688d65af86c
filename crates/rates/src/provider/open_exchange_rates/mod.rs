//! Open Exchange Rates provider.
//!
//! The free plan only publishes USD-based rates, so any other pair is
//! derived as a cross rate: `from/to = (USD/to) / (USD/from)`.
//! API documentation: https://docs.openexchangerates.org/reference/latest-json

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fxlens_detect::SymbolTable;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::credentials::CredentialLookup;
use crate::errors::RateError;
use crate::models::{CurrencyPair, RateRecord};
use crate::provider::http::{build_client, get_text, parse_json, to_decimal};
use crate::provider::{ProviderDescriptor, RateProvider};

const PROVIDER_ID: &str = "OPEN_EXCHANGE_RATES";
const BASE_CURRENCY: &str = "USD";

pub const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    name: PROVIDER_ID,
    base_endpoint: "https://openexchangerates.org/api",
    priority: 3,
    requires_credential: true,
};

/// Response from /latest.json
#[derive(Debug, Deserialize)]
struct LatestResponse {
    rates: HashMap<String, f64>,
}

pub struct OpenExchangeRatesProvider {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialLookup>,
}

impl OpenExchangeRatesProvider {
    pub fn new(credentials: Arc<dyn CredentialLookup>) -> Self {
        Self {
            client: build_client(),
            base_url: DESCRIPTOR.base_endpoint.to_string(),
            credentials,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// USD-based rate for `code`. USD itself is 1.
fn usd_rate(rates: &HashMap<String, f64>, code: &str, pair: &CurrencyPair) -> Result<Decimal, RateError> {
    if code == BASE_CURRENCY {
        return Ok(Decimal::ONE);
    }
    let rate = rates.get(code).ok_or_else(|| RateError::UnsupportedPair {
        provider: PROVIDER_ID.to_string(),
        pair: pair.to_string(),
    })?;
    to_decimal(PROVIDER_ID, *rate)
}

fn parse_latest(body: &str, pair: &CurrencyPair) -> Result<RateRecord, RateError> {
    let response: LatestResponse = parse_json(PROVIDER_ID, body)?;
    let from = usd_rate(&response.rates, &pair.from, pair)?;
    let to = usd_rate(&response.rates, &pair.to, pair)?;

    let rate = to.checked_div(from).ok_or_else(|| RateError::InvalidRate {
        provider: PROVIDER_ID.to_string(),
        message: format!("Cannot derive {} from USD rates {} and {}", pair, from, to),
    })?;

    Ok(RateRecord::new(pair, rate.normalize(), PROVIDER_ID, Utc::now()))
}

#[async_trait]
impl RateProvider for OpenExchangeRatesProvider {
    fn descriptor(&self) -> ProviderDescriptor {
        DESCRIPTOR
    }

    fn supports(&self, pair: &CurrencyPair) -> bool {
        SymbolTable::is_fiat(&pair.from) && SymbolTable::is_fiat(&pair.to)
    }

    async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<RateRecord, RateError> {
        let app_id = self.credentials.get_credential(PROVIDER_ID).ok_or_else(|| {
            RateError::ProviderRejected {
                provider: PROVIDER_ID.to_string(),
                message: "missing credential".to_string(),
            }
        })?;

        let url = format!("{}/latest.json", self.base_url);
        let symbols = format!("{},{}", pair.from, pair.to);
        let query = [("app_id", app_id.as_str()), ("symbols", symbols.as_str())];
        let body = get_text(&self.client, PROVIDER_ID, &url, &query, pair).await?;
        parse_latest(&body, pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;
    use rust_decimal_macros::dec;

    const BODY: &str = r#"{
        "disclaimer": "Usage subject to terms",
        "timestamp": 1709251200,
        "base": "USD",
        "rates": {"EUR": 0.8, "GBP": 0.5, "JPY": 150.0}
    }"#;

    #[test]
    fn test_direct_usd_rate() {
        let record = parse_latest(BODY, &CurrencyPair::new("USD", "JPY")).unwrap();
        assert_eq!(record.rate, dec!(150));
    }

    #[test]
    fn test_cross_rate() {
        let record = parse_latest(BODY, &CurrencyPair::new("GBP", "EUR")).unwrap();
        assert_eq!(record.rate, dec!(1.6));

        let record = parse_latest(BODY, &CurrencyPair::new("EUR", "USD")).unwrap();
        assert_eq!(record.rate, dec!(1.25));
    }

    #[test]
    fn test_missing_symbol_is_unsupported() {
        let err = parse_latest(BODY, &CurrencyPair::new("USD", "CHF")).unwrap_err();
        assert!(matches!(err, RateError::UnsupportedPair { .. }));
    }

    #[test]
    fn test_zero_base_rate_is_invalid() {
        let body = r#"{"rates": {"EUR": 0.0, "GBP": 0.5}}"#;
        let err = parse_latest(body, &CurrencyPair::new("EUR", "GBP")).unwrap_err();
        assert!(matches!(err, RateError::InvalidRate { .. }));
    }

    #[tokio::test]
    async fn test_missing_credential_is_rejected() {
        let provider = OpenExchangeRatesProvider::new(Arc::new(StaticCredentials::new()));
        let err = provider
            .fetch_rate(&CurrencyPair::new("EUR", "USD"))
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::ProviderRejected { .. }));
        assert_eq!(provider.priority(), 3);
    }
}
