use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::pair::CurrencyPair;

/// Source name used for the synthetic `from == to` rate.
pub const SAME_CURRENCY_SOURCE: &str = "same-currency";

/// An exchange rate: 1 `from_currency` = `rate` `to_currency`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRecord {
    pub from_currency: String,
    pub to_currency: String,

    /// Kept as a string so persisted crypto rates keep every digit.
    #[serde(with = "rust_decimal::serde::str")]
    pub rate: Decimal,

    /// Provider name (FRANKFURTER, COINGECKO, ...) or `same-currency`.
    pub source: String,

    pub fetched_at: DateTime<Utc>,

    /// Set by the cache tier the record was stored in. A record straight
    /// from a provider expires at `fetched_at`.
    pub expires_at: DateTime<Utc>,

    /// Served from the cache rather than a provider.
    #[serde(default)]
    pub cached: bool,

    /// Served from the offline tier after every provider failed.
    #[serde(default)]
    pub offline: bool,
}

impl RateRecord {
    /// A freshly fetched rate.
    pub fn new(
        pair: &CurrencyPair,
        rate: Decimal,
        source: impl Into<String>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            from_currency: pair.from.clone(),
            to_currency: pair.to.clone(),
            rate,
            source: source.into(),
            fetched_at,
            expires_at: fetched_at,
            cached: false,
            offline: false,
        }
    }

    /// The synthetic rate of 1 for `code -> code`.
    pub fn identity(code: &str, now: DateTime<Utc>) -> Self {
        Self::new(
            &CurrencyPair::new(code, code),
            Decimal::ONE,
            SAME_CURRENCY_SOURCE,
            now,
        )
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.from_currency, &self.to_currency)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_identity_record() {
        let now = Utc::now();
        let record = RateRecord::identity("CHF", now);
        assert_eq!(record.rate, Decimal::ONE);
        assert_eq!(record.source, SAME_CURRENCY_SOURCE);
        assert_eq!(record.pair(), CurrencyPair::new("CHF", "CHF"));
        assert!(!record.cached);
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let now = Utc::now();
        let mut record = RateRecord::new(&CurrencyPair::new("EUR", "USD"), dec!(1.08), "TEST", now);
        record.expires_at = now + Duration::minutes(15);

        assert!(!record.is_expired(now));
        assert!(!record.is_expired(now + Duration::minutes(14)));
        assert!(record.is_expired(now + Duration::minutes(15)));
    }

    #[test]
    fn test_serializes_camel_case() {
        let record = RateRecord::new(
            &CurrencyPair::new("EUR", "USD"),
            dec!(1.08),
            "FRANKFURTER",
            Utc::now(),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["fromCurrency"], "EUR");
        assert_eq!(json["toCurrency"], "USD");
        assert!(json.get("expiresAt").is_some());
    }

    #[test]
    fn test_long_precision_rate_survives_json() {
        // Inverse crypto quotes use the full 28-digit scale
        let rate = dec!(0.0000155949581876543210987654);
        let record = RateRecord::new(&CurrencyPair::new("USD", "BTC"), rate, "COINGECKO", Utc::now());

        let json = serde_json::to_string(&record).unwrap();
        let back: RateRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rate, rate);
        assert_eq!(back, record);
    }
}
