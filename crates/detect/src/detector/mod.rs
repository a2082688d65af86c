//! Mention detection.
//!
//! [`MentionDetector`] runs an ordered list of [`Matcher`]s over the text.
//! Every matcher sees the whole text and contributes its own candidates;
//! candidates below the confidence threshold are discarded. Use
//! [`MentionDetector::scan`] to also resolve overlaps.

mod context;
mod matchers;

use log::debug;
use serde::{Deserialize, Serialize};

pub use context::{
    ContextMatcher, CONTEXT_CONFIDENCE, CURRENCY_KEYWORD_WEIGHT, TRANSACTIONAL_KEYWORD_WEIGHT,
};
pub use matchers::{
    CodePrefixMatcher, CodeSuffixMatcher, CryptoMatcher, Matcher, SymbolPrefixMatcher,
    SymbolSuffixMatcher, WordPrefixMatcher, WordSuffixMatcher, CODE_PREFIX_CONFIDENCE,
    CODE_SUFFIX_CONFIDENCE, CRYPTO_CONFIDENCE, SYMBOL_PREFIX_CONFIDENCE,
    SYMBOL_SUFFIX_CONFIDENCE, SYMBOL_SUFFIX_SPACED_CONFIDENCE, WORD_CONFIDENCE,
};

use crate::models::{CurrencyMention, DetectionReport};
use crate::overlap::OverlapResolver;

/// Default minimum confidence for a candidate to be reported.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Default context window, in characters on each side of a bare number.
pub const DEFAULT_CONTEXT_RADIUS: usize = 50;

/// Detector settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorConfig {
    /// Candidates below this confidence are dropped.
    pub confidence_threshold: f64,
    /// Context window radius in characters.
    pub context_radius: usize,
    /// Currency assumed for bare numbers near transactional wording.
    pub base_currency: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            context_radius: DEFAULT_CONTEXT_RADIUS,
            base_currency: "USD".to_string(),
        }
    }
}

/// Finds currency mentions in free text.
///
/// Detection is deterministic and never fails: text with nothing to find
/// yields an empty list.
pub struct MentionDetector {
    matchers: Vec<Box<dyn Matcher>>,
    config: DetectorConfig,
}

impl MentionDetector {
    /// Detector with the default pattern families and settings.
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    /// Detector with the default pattern families and custom settings.
    pub fn with_config(config: DetectorConfig) -> Self {
        let matchers: Vec<Box<dyn Matcher>> = vec![
            Box::new(SymbolPrefixMatcher),
            Box::new(SymbolSuffixMatcher),
            Box::new(CodePrefixMatcher),
            Box::new(CodeSuffixMatcher),
            Box::new(CryptoMatcher),
            Box::new(WordPrefixMatcher),
            Box::new(WordSuffixMatcher),
            Box::new(ContextMatcher::new(
                config.base_currency.clone(),
                config.context_radius,
            )),
        ];
        Self { matchers, config }
    }

    /// Add a pattern family. It runs after the built-in explicit families
    /// and before context inference, so it wins confidence ties against the
    /// latter.
    pub fn add_matcher(&mut self, matcher: Box<dyn Matcher>) {
        let position = self.matchers.len().saturating_sub(1);
        self.matchers.insert(position, matcher);
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// All candidates at or above the confidence threshold, in matcher
    /// order. Candidates may overlap.
    pub fn detect(&self, text: &str) -> Vec<CurrencyMention> {
        if !text.chars().any(|c| c.is_ascii_digit()) {
            return Vec::new();
        }

        let threshold = self.config.confidence_threshold;
        self.matchers.iter().fold(Vec::new(), |mut acc, matcher| {
            let found = matcher.find(text);
            if !found.is_empty() {
                debug!("{} matcher found {} candidate(s)", matcher.name(), found.len());
            }
            acc.extend(found.into_iter().filter(|m| m.confidence >= threshold));
            acc
        })
    }

    /// Detect and resolve overlaps, best mention first.
    pub fn scan(&self, text: &str) -> DetectionReport {
        DetectionReport::new(OverlapResolver::resolve(self.detect(text)))
    }
}

impl Default for MentionDetector {
    fn default() -> Self {
        Self::new()
    }
}
