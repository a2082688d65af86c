//! CoinGecko cryptocurrency price provider.
//!
//! Quotes crypto against fiat (and the reverse, by inverting the price)
//! through `/simple/price`. Assets are addressed by their CoinGecko id from
//! the crypto table. The public endpoint needs no API key.
//! API documentation: https://docs.coingecko.com/reference/simple-price

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use fxlens_detect::{CryptoAsset, SymbolTable};
use reqwest::Client;
use rust_decimal::Decimal;

use crate::errors::RateError;
use crate::models::{CurrencyPair, RateRecord};
use crate::provider::http::{build_client, get_text, parse_json, to_decimal};
use crate::provider::{ProviderDescriptor, RateProvider};

const PROVIDER_ID: &str = "COINGECKO";

pub const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    name: PROVIDER_ID,
    base_endpoint: "https://api.coingecko.com/api/v3",
    priority: 4,
    requires_credential: false,
};

/// Response from /simple/price: `{ "<id>": { "<vs_currency>": price } }`
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

/// How a pair maps onto a single `/simple/price` lookup.
#[derive(Debug)]
struct PriceQuery {
    asset: &'static CryptoAsset,
    vs_currency: String,
    /// The pair is fiat -> crypto, so the price is inverted.
    inverted: bool,
}

impl PriceQuery {
    fn for_pair(pair: &CurrencyPair) -> Option<Self> {
        if let Some(asset) = SymbolTable::crypto_asset(&pair.from) {
            return Some(Self {
                asset,
                vs_currency: pair.to.to_lowercase(),
                inverted: false,
            });
        }
        SymbolTable::crypto_asset(&pair.to).map(|asset| Self {
            asset,
            vs_currency: pair.from.to_lowercase(),
            inverted: true,
        })
    }
}

pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        Self {
            client: build_client(),
            base_url: DESCRIPTOR.base_endpoint.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_price(body: &str, query: &PriceQuery, pair: &CurrencyPair) -> Result<RateRecord, RateError> {
    let response: SimplePriceResponse = parse_json(PROVIDER_ID, body)?;
    let price = response
        .get(query.asset.coingecko_id)
        .and_then(|prices| prices.get(&query.vs_currency))
        .ok_or_else(|| RateError::UnsupportedPair {
            provider: PROVIDER_ID.to_string(),
            pair: pair.to_string(),
        })?;
    let price = to_decimal(PROVIDER_ID, *price)?;

    let rate = if query.inverted {
        Decimal::ONE
            .checked_div(price)
            .ok_or_else(|| RateError::InvalidRate {
                provider: PROVIDER_ID.to_string(),
                message: format!("Cannot invert price {} for {}", price, pair),
            })?
    } else {
        price
    };

    Ok(RateRecord::new(pair, rate, PROVIDER_ID, Utc::now()))
}

#[async_trait]
impl RateProvider for CoinGeckoProvider {
    fn descriptor(&self) -> ProviderDescriptor {
        DESCRIPTOR
    }

    /// Exactly one side must be crypto; the other must be fiat or BTC/ETH,
    /// which CoinGecko also accepts as quote currencies.
    fn supports(&self, pair: &CurrencyPair) -> bool {
        let from_crypto = SymbolTable::crypto_asset(&pair.from).is_some();
        let to_crypto = SymbolTable::crypto_asset(&pair.to).is_some();
        match (from_crypto, to_crypto) {
            (true, false) => SymbolTable::is_fiat(&pair.to),
            (false, true) => SymbolTable::is_fiat(&pair.from),
            (true, true) => matches!(pair.to.as_str(), "BTC" | "ETH"),
            (false, false) => false,
        }
    }

    async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<RateRecord, RateError> {
        let query = PriceQuery::for_pair(pair).ok_or_else(|| RateError::UnsupportedPair {
            provider: PROVIDER_ID.to_string(),
            pair: pair.to_string(),
        })?;

        let url = format!("{}/simple/price", self.base_url);
        let params = [
            ("ids", query.asset.coingecko_id),
            ("vs_currencies", query.vs_currency.as_str()),
        ];
        let body = get_text(&self.client, PROVIDER_ID, &url, &params, pair).await?;
        parse_price(&body, &query, pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_supports() {
        let provider = CoinGeckoProvider::new();
        assert!(provider.supports(&CurrencyPair::new("BTC", "USD")));
        assert!(provider.supports(&CurrencyPair::new("EUR", "ETH")));
        assert!(provider.supports(&CurrencyPair::new("SOL", "BTC")));
        assert!(!provider.supports(&CurrencyPair::new("EUR", "USD")));
        assert!(!provider.supports(&CurrencyPair::new("BTC", "SOL")));
    }

    #[test]
    fn test_parse_crypto_to_fiat() {
        let pair = CurrencyPair::new("BTC", "USD");
        let query = PriceQuery::for_pair(&pair).unwrap();
        assert_eq!(query.asset.coingecko_id, "bitcoin");
        assert!(!query.inverted);

        let record = parse_price(r#"{"bitcoin":{"usd":64000.5}}"#, &query, &pair).unwrap();
        assert_eq!(record.rate, dec!(64000.5));
        assert_eq!(record.source, "COINGECKO");
    }

    #[test]
    fn test_parse_fiat_to_crypto_inverts() {
        let pair = CurrencyPair::new("USD", "ETH");
        let query = PriceQuery::for_pair(&pair).unwrap();
        assert!(query.inverted);
        assert_eq!(query.vs_currency, "usd");

        let record = parse_price(r#"{"ethereum":{"usd":2500}}"#, &query, &pair).unwrap();
        assert_eq!(record.rate, dec!(0.0004));
    }

    #[test]
    fn test_unknown_vs_currency_is_unsupported() {
        let pair = CurrencyPair::new("BTC", "XOF");
        let query = PriceQuery::for_pair(&pair).unwrap();
        let err = parse_price(r#"{"bitcoin":{}}"#, &query, &pair).unwrap_err();
        assert!(matches!(err, RateError::UnsupportedPair { .. }));
    }

    #[test]
    fn test_zero_price_cannot_be_inverted() {
        let pair = CurrencyPair::new("USD", "BTC");
        let query = PriceQuery::for_pair(&pair).unwrap();
        let err = parse_price(r#"{"bitcoin":{"usd":0}}"#, &query, &pair).unwrap_err();
        assert!(matches!(err, RateError::InvalidRate { .. }));
    }
}
