//! Rate sanity checks applied to every provider response.

use rust_decimal::Decimal;

use crate::errors::RateError;
use crate::models::RateRecord;

/// Rate validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Largest rate accepted. Rates above this are treated as garbage.
    pub max_rate: Option<Decimal>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            // Above every real fiat and crypto cross rate by a wide margin.
            max_rate: Some(Decimal::from(1_000_000_000_000i64)),
        }
    }
}

/// Rejects zero, negative and absurd rates before they reach the cache.
#[derive(Clone, Debug, Default)]
pub struct RateValidator {
    config: ValidatorConfig,
}

impl RateValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a provider record. Failures are `InvalidRate`, which sends
    /// the orchestrator to the next provider.
    pub fn validate(&self, record: &RateRecord) -> Result<(), RateError> {
        let invalid = |message: String| RateError::InvalidRate {
            provider: record.source.clone(),
            message,
        };

        if record.rate <= Decimal::ZERO {
            return Err(invalid(format!(
                "non-positive rate {} for {}",
                record.rate,
                record.pair()
            )));
        }

        if let Some(max) = self.config.max_rate {
            if record.rate > max {
                return Err(invalid(format!(
                    "rate {} for {} exceeds ceiling {}",
                    record.rate,
                    record.pair(),
                    max
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CurrencyPair;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn record(rate: Decimal) -> RateRecord {
        RateRecord::new(&CurrencyPair::new("EUR", "USD"), rate, "TEST", Utc::now())
    }

    #[test]
    fn test_accepts_normal_rates() {
        let validator = RateValidator::new();
        assert!(validator.validate(&record(dec!(1.0850))).is_ok());
        assert!(validator.validate(&record(dec!(0.00000123))).is_ok());
    }

    #[test]
    fn test_rejects_zero_and_negative() {
        let validator = RateValidator::new();
        for rate in [Decimal::ZERO, dec!(-1.5)] {
            let err = validator.validate(&record(rate)).unwrap_err();
            assert!(matches!(err, RateError::InvalidRate { ref provider, .. } if provider == "TEST"));
        }
    }

    #[test]
    fn test_ceiling() {
        let validator = RateValidator::with_config(ValidatorConfig {
            max_rate: Some(dec!(100)),
        });
        assert!(validator.validate(&record(dec!(100))).is_ok());
        assert!(validator.validate(&record(dec!(100.01))).is_err());

        let unbounded = RateValidator::with_config(ValidatorConfig { max_rate: None });
        assert!(unbounded.validate(&record(Decimal::from(u64::MAX))).is_ok());
    }
}
