//! Pattern-family matchers.
//!
//! Each matcher scans the whole text independently and returns every
//! candidate it finds; no matcher suppresses another. Overlaps between
//! families are settled later by [`OverlapResolver`](crate::OverlapResolver).

use std::ops::Range;

use lazy_static::lazy_static;
use log::debug;
use regex::{Captures, Match, Regex};
use rust_decimal::Decimal;

use crate::models::{CurrencyMention, MentionFormat};
use crate::number::NumberParser;
use crate::symbols::SymbolTable;

/// Confidence for `$1,234.56`.
pub const SYMBOL_PREFIX_CONFIDENCE: f64 = 0.90;
/// Confidence for `1234.56$`.
pub const SYMBOL_SUFFIX_CONFIDENCE: f64 = 0.85;
/// Confidence for `1234.56 $`.
pub const SYMBOL_SUFFIX_SPACED_CONFIDENCE: f64 = 0.80;
/// Confidence for `USD 100`.
pub const CODE_PREFIX_CONFIDENCE: f64 = 0.85;
/// Confidence for `100 USD`.
pub const CODE_SUFFIX_CONFIDENCE: f64 = 0.80;
/// Confidence for crypto glyphs, codes and names.
pub const CRYPTO_CONFIDENCE: f64 = 0.95;
/// Confidence for `100 dollars` and `dollars 100`.
pub const WORD_CONFIDENCE: f64 = 0.70;

/// An amount written in any supported locale convention. Grouping by
/// non-breaking and thin spaces is accepted; plain spaces are not, so that
/// adjacent numbers in prose stay separate.
pub(crate) const NUMBER_PATTERN: &str =
    r"[0-9]+(?:[.,'\x{2019}\x{00A0}\x{202F}\x{2009}][0-9]+)*(?:[eE][+-]?[0-9]+)?";

/// Optional magnitude word after an amount.
const SCALE_PATTERN: &str =
    r"(?:\s?(?P<scale>(?i:thousand|million|billion|trillion|mn|bn|k|m))\b)?";

/// Spoken names too common in ordinary English to anchor a prefix match
/// ("won 3 games", "pound 2 nails").
const PREFIX_EXCLUDED_WORDS: &[&str] = &["won", "pound", "pounds", "rand", "bucks", "lira"];

lazy_static! {
    static ref SYMBOL_ALTERNATION: String =
        alternation(SymbolTable::fiat_symbols().iter().map(|(s, _)| *s));
    static ref CODE_ALTERNATION: String = alternation(SymbolTable::fiat_codes().iter().copied());
    static ref WORD_ALTERNATION: String =
        alternation(SymbolTable::fiat_words().iter().map(|(w, _)| *w));
    static ref PREFIX_WORD_ALTERNATION: String = alternation(
        SymbolTable::fiat_words()
            .iter()
            .map(|(w, _)| *w)
            .filter(|w| !PREFIX_EXCLUDED_WORDS.contains(w))
    );
    static ref CRYPTO_GLYPH_ALTERNATION: String = alternation(
        SymbolTable::crypto_assets()
            .iter()
            .filter_map(|a| a.glyph)
    );
    static ref CRYPTO_CODE_ALTERNATION: String =
        alternation(SymbolTable::crypto_assets().iter().map(|a| a.code));
    static ref CRYPTO_NAME_ALTERNATION: String = alternation(
        SymbolTable::crypto_assets()
            .iter()
            .flat_map(|a| a.aliases.iter().copied())
    );

    static ref SYMBOL_PREFIX_REGEX: Regex = Regex::new(&format!(
        r"(?P<cur>{})\s?(?P<num>{}){}",
        *SYMBOL_ALTERNATION, NUMBER_PATTERN, SCALE_PATTERN
    ))
    .expect("Invalid regex pattern");

    static ref SYMBOL_SUFFIX_REGEX: Regex = Regex::new(&format!(
        r"(?P<num>{})(?P<gap>\s?)(?P<cur>{})",
        NUMBER_PATTERN, *SYMBOL_ALTERNATION
    ))
    .expect("Invalid regex pattern");

    static ref CODE_PREFIX_REGEX: Regex = Regex::new(&format!(
        r"\b(?P<cur>{})\s?(?P<num>{}){}",
        *CODE_ALTERNATION, NUMBER_PATTERN, SCALE_PATTERN
    ))
    .expect("Invalid regex pattern");

    static ref CODE_SUFFIX_REGEX: Regex = Regex::new(&format!(
        r"(?P<num>{}){}\s?(?P<cur>{})\b",
        NUMBER_PATTERN, SCALE_PATTERN, *CODE_ALTERNATION
    ))
    .expect("Invalid regex pattern");

    static ref WORD_PREFIX_REGEX: Regex = Regex::new(&format!(
        r"\b(?P<cur>(?i:{}))\s+(?P<num>{})",
        *PREFIX_WORD_ALTERNATION, NUMBER_PATTERN
    ))
    .expect("Invalid regex pattern");

    static ref WORD_SUFFIX_REGEX: Regex = Regex::new(&format!(
        r"(?P<num>{}){}\s*(?:-\s*)?(?P<cur>(?i:{}))\b",
        NUMBER_PATTERN, SCALE_PATTERN, *WORD_ALTERNATION
    ))
    .expect("Invalid regex pattern");

    static ref CRYPTO_GLYPH_REGEX: Regex = Regex::new(&format!(
        r"(?P<cur>{})\s?(?P<num>{})",
        *CRYPTO_GLYPH_ALTERNATION, NUMBER_PATTERN
    ))
    .expect("Invalid regex pattern");

    static ref CRYPTO_CODE_PREFIX_REGEX: Regex = Regex::new(&format!(
        r"\b(?P<cur>{})\s?(?P<num>{})",
        *CRYPTO_CODE_ALTERNATION, NUMBER_PATTERN
    ))
    .expect("Invalid regex pattern");

    static ref CRYPTO_SUFFIX_REGEX: Regex = Regex::new(&format!(
        r"(?P<num>{})\s?(?P<cur>{}|(?i:{}))\b",
        NUMBER_PATTERN, *CRYPTO_CODE_ALTERNATION, *CRYPTO_NAME_ALTERNATION
    ))
    .expect("Invalid regex pattern");
}

/// A single pattern family.
///
/// Implementations must be pure: the same text always yields the same
/// candidates, and scanning never fails. Unparsable candidates are dropped.
pub trait Matcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Scan `text` and return every candidate of this family.
    fn find(&self, text: &str) -> Vec<CurrencyMention>;
}

/// `$1,234.56`, `€ 5`, `C$2.5m`
pub struct SymbolPrefixMatcher;

impl Matcher for SymbolPrefixMatcher {
    fn name(&self) -> &'static str {
        "symbol-prefix"
    }

    fn find(&self, text: &str) -> Vec<CurrencyMention> {
        collect_matches(text, &SYMBOL_PREFIX_REGEX, MentionFormat::SymbolPrefix, |caps| {
            let code = SymbolTable::symbol_or_word_to_currency(caps.name("cur")?.as_str())?;
            Some((code, SYMBOL_PREFIX_CONFIDENCE))
        })
    }
}

/// `1234.56$`, `100 €`, `250 kr`
pub struct SymbolSuffixMatcher;

impl Matcher for SymbolSuffixMatcher {
    fn name(&self) -> &'static str {
        "symbol-suffix"
    }

    fn find(&self, text: &str) -> Vec<CurrencyMention> {
        collect_matches(text, &SYMBOL_SUFFIX_REGEX, MentionFormat::SymbolSuffix, |caps| {
            let code = SymbolTable::symbol_or_word_to_currency(caps.name("cur")?.as_str())?;
            let spaced = caps.name("gap").is_some_and(|g| !g.as_str().is_empty());
            let confidence = if spaced {
                SYMBOL_SUFFIX_SPACED_CONFIDENCE
            } else {
                SYMBOL_SUFFIX_CONFIDENCE
            };
            Some((code, confidence))
        })
    }
}

/// `USD 100`, `EUR1.234,56`
pub struct CodePrefixMatcher;

impl Matcher for CodePrefixMatcher {
    fn name(&self) -> &'static str {
        "code-prefix"
    }

    fn find(&self, text: &str) -> Vec<CurrencyMention> {
        collect_matches(text, &CODE_PREFIX_REGEX, MentionFormat::CodePrefix, |caps| {
            let code = SymbolTable::symbol_or_word_to_currency(caps.name("cur")?.as_str())?;
            Some((code, CODE_PREFIX_CONFIDENCE))
        })
    }
}

/// `100 USD`, `2.5 million GBP`
pub struct CodeSuffixMatcher;

impl Matcher for CodeSuffixMatcher {
    fn name(&self) -> &'static str {
        "code-suffix"
    }

    fn find(&self, text: &str) -> Vec<CurrencyMention> {
        collect_matches(text, &CODE_SUFFIX_REGEX, MentionFormat::CodeSuffix, |caps| {
            let code = SymbolTable::symbol_or_word_to_currency(caps.name("cur")?.as_str())?;
            Some((code, CODE_SUFFIX_CONFIDENCE))
        })
    }
}

/// `₿0.5`, `ETH 2`, `1.5 BTC`, `3 bitcoins`
pub struct CryptoMatcher;

impl Matcher for CryptoMatcher {
    fn name(&self) -> &'static str {
        "crypto"
    }

    fn find(&self, text: &str) -> Vec<CurrencyMention> {
        let classify = |caps: &Captures<'_>| {
            let code = SymbolTable::symbol_or_word_to_currency(caps.name("cur")?.as_str())?;
            SymbolTable::crypto_asset(code).map(|asset| (asset.code, CRYPTO_CONFIDENCE))
        };

        let mut mentions = Vec::new();
        for regex in [
            &*CRYPTO_GLYPH_REGEX,
            &*CRYPTO_CODE_PREFIX_REGEX,
            &*CRYPTO_SUFFIX_REGEX,
        ] {
            mentions.extend(collect_matches(text, regex, MentionFormat::Crypto, classify));
        }
        mentions.sort_by_key(|m| m.range.start);
        mentions
    }
}

/// `dollars 100`, `euro 50`
pub struct WordPrefixMatcher;

impl Matcher for WordPrefixMatcher {
    fn name(&self) -> &'static str {
        "word-prefix"
    }

    fn find(&self, text: &str) -> Vec<CurrencyMention> {
        collect_matches(text, &WORD_PREFIX_REGEX, MentionFormat::WordPrefix, |caps| {
            let code = word_to_currency(caps.name("cur")?.as_str())?;
            Some((code, WORD_CONFIDENCE))
        })
    }
}

/// `100 dollars`, `1.5 million swiss francs`, `20-euro`
pub struct WordSuffixMatcher;

impl Matcher for WordSuffixMatcher {
    fn name(&self) -> &'static str {
        "word-suffix"
    }

    fn find(&self, text: &str) -> Vec<CurrencyMention> {
        collect_matches(text, &WORD_SUFFIX_REGEX, MentionFormat::WordSuffix, |caps| {
            let code = word_to_currency(caps.name("cur")?.as_str())?;
            Some((code, WORD_CONFIDENCE))
        })
    }
}

/// Run `regex` over `text` and turn each hit into a mention.
///
/// `classify` maps the captures to a currency code and confidence; returning
/// `None` drops the candidate. Hits glued to surrounding alphanumerics
/// (`abc$5`, `100 Ftx`) and unparsable amounts are dropped as well.
fn collect_matches<F>(
    text: &str,
    regex: &Regex,
    format: MentionFormat,
    classify: F,
) -> Vec<CurrencyMention>
where
    F: Fn(&Captures<'_>) -> Option<(&'static str, f64)>,
{
    let mut mentions = Vec::new();

    for caps in regex.captures_iter(text) {
        let (Some(whole), Some(number)) = (caps.get(0), caps.name("num")) else {
            continue;
        };

        if !is_isolated(text, whole.range()) {
            continue;
        }

        let Some((code, confidence)) = classify(&caps) else {
            continue;
        };

        let amount = match parse_amount(number, caps.name("scale")) {
            Some(amount) => amount,
            None => continue,
        };

        mentions.push(CurrencyMention {
            amount,
            currency_code: code.to_string(),
            source_text: whole.as_str().to_string(),
            range: whole.range(),
            format,
            confidence,
        });
    }

    mentions
}

/// Parse an amount and apply an optional magnitude word.
pub(crate) fn parse_amount(number: Match<'_>, scale: Option<Match<'_>>) -> Option<Decimal> {
    let value = match NumberParser::parse(number.as_str()) {
        Ok(value) => value,
        Err(e) => {
            debug!("Dropping candidate '{}': {}", number.as_str(), e);
            return None;
        }
    };

    match scale {
        Some(scale) => value.checked_mul(scale_factor(scale.as_str())),
        None => Some(value),
    }
}

fn scale_factor(word: &str) -> Decimal {
    match word.to_ascii_lowercase().as_str() {
        "thousand" | "k" => Decimal::from(1_000u64),
        "million" | "mn" | "m" => Decimal::from(1_000_000u64),
        "billion" | "bn" => Decimal::from(1_000_000_000u64),
        "trillion" => Decimal::from(1_000_000_000_000u64),
        _ => Decimal::ONE,
    }
}

fn word_to_currency(word: &str) -> Option<&'static str> {
    let normalized = word.split_whitespace().collect::<Vec<_>>().join(" ");
    SymbolTable::symbol_or_word_to_currency(&normalized)
}

/// Whether the match is not glued to ASCII letters or digits on either side.
pub(crate) fn is_isolated(text: &str, range: Range<usize>) -> bool {
    let before = text[..range.start].chars().next_back();
    let after = text[range.end..].chars().next();
    !before.is_some_and(|c| c.is_ascii_alphanumeric())
        && !after.is_some_and(|c| c.is_ascii_alphanumeric())
}

/// Build a regex alternation, longest token first so that `US$` wins over
/// `$` and `swiss francs` over `francs`. Spaces inside names match any run
/// of whitespace.
pub(crate) fn alternation<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    let mut tokens: Vec<&str> = tokens.into_iter().collect();
    tokens.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });
    tokens.dedup();
    tokens
        .iter()
        .map(|t| regex::escape(t).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}
