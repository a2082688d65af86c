//! Detected mentions and scan reports.

use std::ops::Range;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The pattern family that produced a mention.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MentionFormat {
    /// `$1,234.56`
    SymbolPrefix,
    /// `1234.56€`
    SymbolSuffix,
    /// `USD 100`
    CodePrefix,
    /// `100 USD`
    CodeSuffix,
    /// `dollars 100`
    WordPrefix,
    /// `100 dollars`
    WordSuffix,
    /// `₿0.5`, `1.5 BTC`
    Crypto,
    /// A bare number whose currency was inferred from surrounding words.
    ContextInferred,
}

impl MentionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SymbolPrefix => "symbolPrefix",
            Self::SymbolSuffix => "symbolSuffix",
            Self::CodePrefix => "codePrefix",
            Self::CodeSuffix => "codeSuffix",
            Self::WordPrefix => "wordPrefix",
            Self::WordSuffix => "wordSuffix",
            Self::Crypto => "crypto",
            Self::ContextInferred => "contextInferred",
        }
    }
}

impl std::fmt::Display for MentionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected amount and currency within a text span.
///
/// `range` is a byte range into the scanned text and always lies on
/// `char` boundaries, so `&text[mention.range.clone()] == mention.source_text`.
/// Mentions are never modified after detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyMention {
    pub amount: Decimal,
    pub currency_code: String,
    pub source_text: String,
    pub range: Range<usize>,
    pub format: MentionFormat,
    /// Certainty in `[0, 1]`.
    pub confidence: f64,
}

impl CurrencyMention {
    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }

    /// Whether the two mentions share at least one byte of text.
    pub fn overlaps(&self, other: &CurrencyMention) -> bool {
        !(self.end() <= other.start() || self.start() >= other.end())
    }
}

/// Result of a full scan: resolved mentions plus annotations that belong
/// to the scan rather than to any single mention.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    /// Non-overlapping mentions, best first.
    pub mentions: Vec<CurrencyMention>,
    /// Set when more than one mention survived overlap resolution.
    pub multiple_mentions: bool,
}

impl DetectionReport {
    pub fn new(mentions: Vec<CurrencyMention>) -> Self {
        let multiple_mentions = mentions.len() > 1;
        Self {
            mentions,
            multiple_mentions,
        }
    }

    /// The highest-ranked mention, if any.
    pub fn best(&self) -> Option<&CurrencyMention> {
        self.mentions.first()
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn mention(range: Range<usize>) -> CurrencyMention {
        CurrencyMention {
            amount: dec!(1),
            currency_code: "USD".to_string(),
            source_text: String::new(),
            range,
            format: MentionFormat::SymbolPrefix,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_overlap_is_half_open() {
        assert!(mention(0..5).overlaps(&mention(4..8)));
        assert!(mention(2..3).overlaps(&mention(0..10)));
        assert!(!mention(0..5).overlaps(&mention(5..8)));
        assert!(!mention(6..9).overlaps(&mention(0..6)));
    }

    #[test]
    fn test_report_multiple_flag() {
        assert!(!DetectionReport::new(vec![mention(0..1)]).multiple_mentions);
        assert!(DetectionReport::new(vec![mention(0..1), mention(3..4)]).multiple_mentions);
        assert!(DetectionReport::new(Vec::new()).is_empty());
    }

    #[test]
    fn test_format_serializes_camel_case() {
        let json = serde_json::to_string(&MentionFormat::ContextInferred).unwrap();
        assert_eq!(json, "\"contextInferred\"");
    }
}
