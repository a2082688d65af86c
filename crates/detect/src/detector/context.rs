//! Currency inference for bare numbers.
//!
//! A number with no symbol, code or name attached can still be a monetary
//! amount when the surrounding words say so: "the flight to Japan was
//! 45000" or "invoice total 1,200". [`ContextMatcher`] looks for such
//! keywords within a character window around each bare number.

use std::collections::HashMap;
use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use super::matchers::{alternation, parse_amount, Matcher, NUMBER_PATTERN};
use crate::models::{CurrencyMention, MentionFormat};
use crate::symbols::SymbolTable;

/// Base confidence of a context-inferred mention before weighting.
pub const CONTEXT_CONFIDENCE: f64 = 0.70;
/// Weight when a country or currency keyword is nearby.
pub const CURRENCY_KEYWORD_WEIGHT: f64 = 1.0;
/// Weight when only transactional wording ("price", "total") is nearby.
/// With the default threshold these candidates are reported by `find` but
/// filtered out by the detector.
pub const TRANSACTIONAL_KEYWORD_WEIGHT: f64 = 0.8;

const CURRENCY_KEYWORDS: &[(&str, &str)] = &[
    ("united states", "USD"),
    ("usa", "USD"),
    ("america", "USD"),
    ("american", "USD"),
    ("dollar", "USD"),
    ("dollars", "USD"),
    ("euro", "EUR"),
    ("euros", "EUR"),
    ("eurozone", "EUR"),
    ("europe", "EUR"),
    ("european", "EUR"),
    ("germany", "EUR"),
    ("german", "EUR"),
    ("france", "EUR"),
    ("french", "EUR"),
    ("italy", "EUR"),
    ("italian", "EUR"),
    ("spain", "EUR"),
    ("spanish", "EUR"),
    ("netherlands", "EUR"),
    ("uk", "GBP"),
    ("britain", "GBP"),
    ("british", "GBP"),
    ("england", "GBP"),
    ("london", "GBP"),
    ("sterling", "GBP"),
    ("japan", "JPY"),
    ("japanese", "JPY"),
    ("tokyo", "JPY"),
    ("yen", "JPY"),
    ("china", "CNY"),
    ("chinese", "CNY"),
    ("yuan", "CNY"),
    ("renminbi", "CNY"),
    ("india", "INR"),
    ("indian", "INR"),
    ("rupee", "INR"),
    ("rupees", "INR"),
    ("canada", "CAD"),
    ("canadian", "CAD"),
    ("australia", "AUD"),
    ("australian", "AUD"),
    ("new zealand", "NZD"),
    ("switzerland", "CHF"),
    ("swiss", "CHF"),
    ("mexico", "MXN"),
    ("mexican", "MXN"),
    ("pesos", "MXN"),
    ("brazil", "BRL"),
    ("brazilian", "BRL"),
    ("reais", "BRL"),
    ("korea", "KRW"),
    ("korean", "KRW"),
    ("russia", "RUB"),
    ("russian", "RUB"),
    ("rubles", "RUB"),
    ("roubles", "RUB"),
    ("sweden", "SEK"),
    ("swedish", "SEK"),
    ("kronor", "SEK"),
    ("norway", "NOK"),
    ("norwegian", "NOK"),
    ("denmark", "DKK"),
    ("danish", "DKK"),
    ("poland", "PLN"),
    ("zloty", "PLN"),
    ("turkey", "TRY"),
    ("turkish", "TRY"),
    ("south africa", "ZAR"),
    ("singapore", "SGD"),
    ("hong kong", "HKD"),
    ("thailand", "THB"),
    ("baht", "THB"),
    ("israel", "ILS"),
    ("shekels", "ILS"),
    ("dubai", "AED"),
    ("dirhams", "AED"),
    ("saudi", "SAR"),
    ("riyals", "SAR"),
    ("hungary", "HUF"),
    ("forints", "HUF"),
    ("malaysia", "MYR"),
    ("ringgit", "MYR"),
    ("indonesia", "IDR"),
    ("rupiah", "IDR"),
    ("ukraine", "UAH"),
    ("hryvnia", "UAH"),
    ("nigeria", "NGN"),
    ("naira", "NGN"),
];

const TRANSACTIONAL_KEYWORDS: &[&str] = &[
    "price", "prices", "priced", "cost", "costs", "invoice", "invoiced", "revenue", "revenues",
    "total", "subtotal", "amount", "paid", "pay", "payment", "salary", "budget", "fee", "fees",
    "fare", "balance", "refund", "sale", "sales", "profit", "income", "expense", "expenses",
    "charge", "charged", "worth", "spent", "spend", "earned", "bill", "tax", "rent", "discount",
];

lazy_static! {
    static ref BARE_NUMBER_REGEX: Regex = Regex::new(NUMBER_PATTERN).expect("Invalid regex pattern");

    static ref CURRENCY_KEYWORD_REGEX: Regex = Regex::new(&format!(
        r"(?i)\b(?:{})\b",
        alternation(CURRENCY_KEYWORDS.iter().map(|(k, _)| *k))
    ))
    .expect("Invalid regex pattern");

    static ref CODE_KEYWORD_REGEX: Regex = Regex::new(&format!(
        r"\b(?:{})\b",
        alternation(SymbolTable::fiat_codes().iter().copied())
    ))
    .expect("Invalid regex pattern");

    static ref TRANSACTIONAL_REGEX: Regex = Regex::new(&format!(
        r"(?i)\b(?:{})\b",
        alternation(TRANSACTIONAL_KEYWORDS.iter().copied())
    ))
    .expect("Invalid regex pattern");

    static ref LEADING_SCALE_REGEX: Regex =
        Regex::new(r"^(?i:thousand|million|billion|trillion|mn|bn|k|m)\b").expect("Invalid regex pattern");

    static ref KEYWORD_MAP: HashMap<&'static str, &'static str> =
        CURRENCY_KEYWORDS.iter().copied().collect();
}

/// Infers a currency for bare numbers from nearby keywords.
///
/// Years (1900-2100), percentages, dates, times and numbers that already
/// sit next to a currency marker are skipped, so a fragment like `$5` only
/// ever yields the explicit symbol-prefix candidate.
pub struct ContextMatcher {
    base_currency: String,
    radius: usize,
}

impl ContextMatcher {
    /// `base_currency` is assumed for transactional wording; `radius` is the
    /// window size in characters on each side of the number.
    pub fn new(base_currency: impl Into<String>, radius: usize) -> Self {
        Self {
            base_currency: base_currency.into(),
            radius,
        }
    }

    fn infer(&self, text: &str, number: &Range<usize>) -> Option<(String, f64)> {
        let window = window_around(text, number, self.radius);
        let haystack = &text[window.clone()];

        let nearest = CURRENCY_KEYWORD_REGEX
            .find_iter(haystack)
            .chain(CODE_KEYWORD_REGEX.find_iter(haystack))
            .filter_map(|kw| {
                let range = (window.start + kw.start())..(window.start + kw.end());
                keyword_currency(kw.as_str()).map(|code| (distance(&range, number), code))
            })
            .min_by_key(|(d, _)| *d);

        if let Some((_, code)) = nearest {
            return Some((code.to_string(), CURRENCY_KEYWORD_WEIGHT));
        }

        if TRANSACTIONAL_REGEX.is_match(haystack) {
            return Some((self.base_currency.clone(), TRANSACTIONAL_KEYWORD_WEIGHT));
        }

        None
    }
}

impl Matcher for ContextMatcher {
    fn name(&self) -> &'static str {
        "context"
    }

    fn find(&self, text: &str) -> Vec<CurrencyMention> {
        let mut mentions = Vec::new();

        for number in BARE_NUMBER_REGEX.find_iter(text) {
            let range = number.range();
            if !is_bare(text, &range) || looks_like_year(number.as_str()) {
                continue;
            }

            let Some(amount) = parse_amount(number, None) else {
                continue;
            };
            if amount <= Decimal::ZERO {
                continue;
            }

            let Some((code, weight)) = self.infer(text, &range) else {
                continue;
            };

            mentions.push(CurrencyMention {
                amount,
                currency_code: code,
                source_text: number.as_str().to_string(),
                range,
                format: MentionFormat::ContextInferred,
                confidence: CONTEXT_CONFIDENCE * weight,
            });
        }

        mentions
    }
}

fn keyword_currency(keyword: &str) -> Option<&'static str> {
    if let Some(code) = SymbolTable::fiat_codes().iter().copied().find(|c| *c == keyword) {
        return Some(code);
    }
    let normalized = keyword
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    KEYWORD_MAP.get(normalized.as_str()).copied()
}

fn distance(keyword: &Range<usize>, number: &Range<usize>) -> usize {
    if keyword.end <= number.start {
        number.start - keyword.end
    } else {
        keyword.start.saturating_sub(number.end)
    }
}

/// Byte range covering up to `radius` characters on each side of `range`.
fn window_around(text: &str, range: &Range<usize>, radius: usize) -> Range<usize> {
    let start = if radius == 0 {
        range.start
    } else {
        text[..range.start]
            .char_indices()
            .rev()
            .nth(radius - 1)
            .map_or(0, |(i, _)| i)
    };
    let end = text[range.end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| range.end + i);
    start..end
}

fn looks_like_year(number: &str) -> bool {
    number.len() == 4
        && number
            .parse::<u16>()
            .is_ok_and(|year| (1900..=2100).contains(&year))
}

/// Whether a number stands on its own: not part of an identifier, date,
/// time, percentage or explicit currency mention.
fn is_bare(text: &str, range: &Range<usize>) -> bool {
    let before = &text[..range.start];
    let after = &text[range.end..];

    let mut back = before.chars().rev();
    match (back.next(), back.next()) {
        (Some(c), _) if c.is_ascii_alphanumeric() => return false,
        (Some('-' | '/' | '.' | ',' | ':'), Some(d)) if d.is_ascii_digit() => return false,
        _ => {}
    }

    let mut forward = after.chars();
    match (forward.next(), forward.next()) {
        (Some(c), _) if c.is_ascii_alphanumeric() || c == '%' || c == '°' => return false,
        (Some('-' | '/' | ':'), Some(d)) if d.is_ascii_digit() => return false,
        _ => {}
    }

    !ends_with_marker(before) && !starts_with_marker(after)
}

/// Whether `before` ends in a currency symbol, code or name.
fn ends_with_marker(before: &str) -> bool {
    let before = before.trim_end();
    let lower = before.to_lowercase();

    SymbolTable::fiat_symbols()
        .iter()
        .any(|(s, _)| ends_with_token(before, s))
        || SymbolTable::fiat_codes()
            .iter()
            .any(|c| ends_with_token(before, c))
        || SymbolTable::fiat_words()
            .iter()
            .any(|(w, _)| ends_with_token(&lower, w))
        || SymbolTable::crypto_assets().iter().any(|a| {
            a.glyph.is_some_and(|g| ends_with_token(before, g))
                || ends_with_token(before, a.code)
                || a.aliases.iter().any(|alias| ends_with_token(&lower, alias))
        })
}

/// Whether `after` opens with a currency symbol, code or name, optionally
/// behind a magnitude word (`5 million dollars`) or hyphen (`20-euro`).
fn starts_with_marker(after: &str) -> bool {
    let mut after = after.trim_start_matches(|c: char| c == '-' || c.is_whitespace());
    if let Some(scale) = LEADING_SCALE_REGEX.find(after) {
        after = after[scale.end()..].trim_start();
    }
    let lower = after.to_lowercase();

    SymbolTable::fiat_symbols()
        .iter()
        .any(|(s, _)| starts_with_token(after, s))
        || SymbolTable::fiat_codes()
            .iter()
            .any(|c| starts_with_token(after, c))
        || SymbolTable::fiat_words()
            .iter()
            .any(|(w, _)| starts_with_token(&lower, w))
        || SymbolTable::crypto_assets().iter().any(|a| {
            a.glyph.is_some_and(|g| starts_with_token(after, g))
                || starts_with_token(after, a.code)
                || a.aliases.iter().any(|alias| starts_with_token(&lower, alias))
        })
}

fn ends_with_token(haystack: &str, token: &str) -> bool {
    haystack.strip_suffix(token).is_some_and(|head| {
        !token.starts_with(|c: char| c.is_ascii_alphanumeric())
            || !head.ends_with(|c: char| c.is_ascii_alphanumeric())
    })
}

fn starts_with_token(haystack: &str, token: &str) -> bool {
    haystack.strip_prefix(token).is_some_and(|tail| {
        !token.ends_with(|c: char| c.is_ascii_alphanumeric())
            || !tail.starts_with(|c: char| c.is_ascii_alphanumeric())
    })
}
