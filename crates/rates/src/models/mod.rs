//! Rate models
//!
//! - `pair` - Normalized currency pair (CurrencyPair)
//! - `rate` - Exchange rate records as fetched and cached (RateRecord)
//! - `conversion` - Conversion request and result shapes

mod conversion;
mod pair;
mod rate;

pub use conversion::{ConversionRequest, ConversionResult};
pub use pair::CurrencyPair;
pub use rate::{RateRecord, SAME_CURRENCY_SOURCE};
