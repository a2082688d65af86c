//! ExchangeRate-API provider.
//!
//! Fiat pairs through the `/pair/{from}/{to}` endpoint. Requires an API key,
//! which is looked up on every call and never stored.
//! API documentation: https://www.exchangerate-api.com/docs/pair-conversion-requests

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fxlens_detect::SymbolTable;
use reqwest::Client;
use serde::Deserialize;

use crate::credentials::CredentialLookup;
use crate::errors::RateError;
use crate::models::{CurrencyPair, RateRecord};
use crate::provider::http::{build_client, get_text, parse_json, to_decimal};
use crate::provider::{ProviderDescriptor, RateProvider};

const PROVIDER_ID: &str = "EXCHANGE_RATE_API";

pub const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    name: PROVIDER_ID,
    base_endpoint: "https://v6.exchangerate-api.com/v6",
    priority: 2,
    requires_credential: true,
};

/// Response from /pair. Errors come back with HTTP 200 and `result: "error"`.
#[derive(Debug, Deserialize)]
struct PairResponse {
    result: String,
    conversion_rate: Option<f64>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

pub struct ExchangeRateApiProvider {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialLookup>,
}

impl ExchangeRateApiProvider {
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

fn parse_pair(body: &str, pair: &CurrencyPair) -> Result<RateRecord, RateError> {
    let response: PairResponse = parse_json(PROVIDER_ID, body)?;

    if response.result != "success" {
        let error_type = response.error_type.unwrap_or_default();
        return Err(error_for(&error_type, pair));
    }

    let rate = response
        .conversion_rate
        .ok_or_else(|| RateError::InvalidRate {
            provider: PROVIDER_ID.to_string(),
            message: "Response has no conversion_rate".to_string(),
        })?;

    Ok(RateRecord::new(
        pair,
        to_decimal(PROVIDER_ID, rate)?,
        PROVIDER_ID,
        Utc::now(),
    ))
}

fn error_for(error_type: &str, pair: &CurrencyPair) -> RateError {
    let provider = PROVIDER_ID.to_string();
    match error_type {
        "unsupported-code" => RateError::UnsupportedPair {
            provider,
            pair: pair.to_string(),
        },
        "invalid-key" | "inactive-account" => RateError::ProviderRejected {
            provider,
            message: error_type.to_string(),
        },
        "quota-reached" => RateError::RateLimited { provider },
        other => RateError::ProviderUnavailable {
            provider,
            message: format!("API error: {}", other),
        },
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    fn descriptor(&self) -> ProviderDescriptor {
        DESCRIPTOR
    }

    fn supports(&self, pair: &CurrencyPair) -> bool {
        SymbolTable::is_fiat(&pair.from) && SymbolTable::is_fiat(&pair.to)
    }

    async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<RateRecord, RateError> {
        let api_key = self.credentials.get_credential(PROVIDER_ID).ok_or_else(|| {
            RateError::ProviderRejected {
                provider: PROVIDER_ID.to_string(),
                message: "missing credential".to_string(),
            }
        })?;

        let url = format!(
            "{}/{}/pair/{}/{}",
            self.base_url, api_key, pair.from, pair.to
        );
        let body = get_text(&self.client, PROVIDER_ID, &url, &[], pair).await?;
        parse_pair(&body, pair)
    }
}
