use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered currency pair, e.g. EUR/USD (1 EUR = rate USD).
///
/// Codes are normalized to trimmed uppercase on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub from: String,
    pub to: String,
}

impl CurrencyPair {
    pub fn new(from: impl AsRef<str>, to: impl AsRef<str>) -> Self {
        Self {
            from: from.as_ref().trim().to_uppercase(),
            to: to.as_ref().trim().to_uppercase(),
        }
    }

    /// `from == to`: the rate is 1 by definition.
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    /// The pair in the opposite direction.
    pub fn inverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_codes() {
        let pair = CurrencyPair::new(" eur", "usd ");
        assert_eq!(pair.from, "EUR");
        assert_eq!(pair.to, "USD");
        assert_eq!(pair.to_string(), "EUR/USD");
    }

    #[test]
    fn test_identity_and_inverse() {
        assert!(CurrencyPair::new("USD", "usd").is_identity());
        let pair = CurrencyPair::new("GBP", "JPY");
        assert!(!pair.is_identity());
        assert_eq!(pair.inverse(), CurrencyPair::new("JPY", "GBP"));
    }
}
