//! fxlens Detect Crate
//!
//! Finds monetary amounts in free-form text and identifies their currency.
//!
//! # Overview
//!
//! - Locale-aware number parsing (`1,234.56`, `1.234,56`, `1'234.56`,
//!   `12,34,567`)
//! - Fiat symbols, ISO codes and spoken names, plus crypto glyphs, codes
//!   and names
//! - Currency inference for bare numbers from nearby keywords
//! - Confidence-ranked overlap resolution
//!
//! # Pipeline
//!
//! ```text
//! text --> [Matcher; N] --> candidates --> threshold --> OverlapResolver --> mentions
//! ```
//!
//! Each matcher handles one pattern family and scans the text on its own.
//! See [`MentionDetector`] for the default family order.

pub mod detector;
pub mod errors;
pub mod models;
pub mod number;
pub mod overlap;
pub mod symbols;

pub use detector::{ContextMatcher, DetectorConfig, Matcher, MentionDetector};
pub use errors::ParseError;
pub use models::{CurrencyMention, DetectionReport, MentionFormat};
pub use number::NumberParser;
pub use overlap::OverlapResolver;
pub use symbols::{CryptoAsset, SymbolTable};
