use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of converting an amount between two currencies.
///
/// Produced once per call and never cached; only the underlying rate is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub original_amount: Decimal,
    pub from_currency: String,
    pub to_currency: String,
    pub converted_amount: Decimal,
    pub rate: Decimal,
    /// Decimal places `converted_amount` was rounded to.
    pub precision: u32,
    pub source: String,
    pub cached: bool,
    pub offline: bool,
    pub timestamp: DateTime<Utc>,
}

/// A conversion request at the caller boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub amount: Decimal,
    pub from_currency: String,
    pub to_currency: String,
}
