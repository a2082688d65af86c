//! Locale-aware numeric parsing.
//!
//! Amounts in free text use conflicting conventions: `1,234.56` in the US,
//! `1.234,56` across most of Europe, `1'234.56` in Switzerland, `1 234,56`
//! in France and `12,34,567` in India. [`NumberParser`] turns any of these
//! into a [`Decimal`] using the following rules:
//!
//! - When both `.` and `,` appear, the rightmost one is the decimal point
//!   and must appear exactly once; the other is the thousands separator.
//! - A single `.` or `,` followed by exactly three digits, with a one to three
//!   digit integer part not starting with `0`, is a thousands separator
//!   (`1,234` is 1234). Any other single separator is a decimal point
//!   (`1,23` is 1.23, `0.125` is 0.125, `1234.567` is 1234.567).
//! - A repeated separator is always a thousands separator.
//! - Apostrophes and (non-breaking) spaces are always thousands separators.
//! - Thousands groups must follow Western (`1,234,567`) or Indian
//!   (`12,34,567`) grouping.
//! - Scientific notation (`1.5e3`) is accepted when no grouping is present.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::errors::ParseError;

/// Separators that can act as a decimal point.
const DECIMAL_CANDIDATES: [char; 2] = ['.', ','];

/// Separators that only ever group thousands.
const GROUPING_ONLY: [char; 6] = ['\'', '\u{2019}', ' ', '\u{00A0}', '\u{202F}', '\u{2009}'];

lazy_static! {
    static ref SCIENTIFIC_REGEX: Regex =
        Regex::new(r"^\d+(?:\.\d+)?[eE][+-]?\d+$").expect("Invalid regex pattern");
}

/// Parser for numeric substrings written in any supported locale convention.
///
/// Stateless and side-effect free; all methods are associated functions.
pub struct NumberParser;

impl NumberParser {
    /// Parse a numeric substring into a decimal value.
    ///
    /// # Examples
    ///
    /// ```
    /// use fxlens_detect::NumberParser;
    /// use rust_decimal::Decimal;
    /// use std::str::FromStr;
    ///
    /// let expected = Decimal::from_str("1234.56").unwrap();
    /// assert_eq!(NumberParser::parse("1.234,56").unwrap(), expected);
    /// assert_eq!(NumberParser::parse("1,234.56").unwrap(), expected);
    /// assert_eq!(NumberParser::parse("1'234.56").unwrap(), expected);
    /// ```
    pub fn parse(raw: &str) -> Result<Decimal, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty);
        }

        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if body.is_empty() {
            return Err(ParseError::Empty);
        }

        let value = if SCIENTIFIC_REGEX.is_match(body) {
            Decimal::from_scientific(body).map_err(|_| ParseError::OutOfRange(body.to_string()))?
        } else {
            Self::parse_grouped(body)?
        };

        Ok(if negative { -value } else { value })
    }

    /// Whether a character is accepted as a separator inside a number.
    pub fn is_separator(ch: char) -> bool {
        DECIMAL_CANDIDATES.contains(&ch) || GROUPING_ONLY.contains(&ch)
    }

    fn parse_grouped(body: &str) -> Result<Decimal, ParseError> {
        let (runs, separators) = split_runs(body)?;

        let Some(&last) = separators.last() else {
            return to_decimal(body, runs[0], None);
        };

        let decimal_separator = if DECIMAL_CANDIDATES.contains(&last) {
            let occurrences = separators.iter().filter(|c| **c == last).count();
            let mixed = separators.iter().any(|c| *c != last);

            if mixed {
                if occurrences > 1 {
                    return Err(ParseError::Ambiguous(body.to_string()));
                }
                Some(last)
            } else if occurrences > 1 {
                None
            } else if looks_like_thousands(runs[0], runs[1]) {
                None
            } else {
                Some(last)
            }
        } else {
            None
        };

        let grouping: &[char] = match decimal_separator {
            Some(_) => &separators[..separators.len() - 1],
            None => &separators,
        };
        if let Some(first) = grouping.first() {
            if grouping.iter().any(|c| c != first) {
                return Err(ParseError::Ambiguous(body.to_string()));
            }
        }

        let (integer_runs, fraction) = match decimal_separator {
            Some(_) => (&runs[..runs.len() - 1], runs.last().copied()),
            None => (&runs[..], None),
        };

        if integer_runs.len() > 1 && !is_western(integer_runs) && !is_indian(integer_runs) {
            return Err(ParseError::InconsistentGrouping(body.to_string()));
        }

        to_decimal(body, &integer_runs.concat(), fraction)
    }
}

/// Split a numeric body into digit runs and the separators between them.
fn split_runs(body: &str) -> Result<(Vec<&str>, Vec<char>), ParseError> {
    let mut runs = Vec::new();
    let mut separators = Vec::new();
    let mut run_start: Option<usize> = None;

    for (idx, ch) in body.char_indices() {
        if ch.is_ascii_digit() {
            if run_start.is_none() {
                run_start = Some(idx);
            }
        } else if NumberParser::is_separator(ch) {
            match run_start.take() {
                Some(start) => runs.push(&body[start..idx]),
                None => return Err(ParseError::MalformedSeparators(body.to_string())),
            }
            separators.push(ch);
        } else {
            return Err(ParseError::InvalidCharacter(ch));
        }
    }

    match run_start {
        Some(start) => runs.push(&body[start..]),
        None => return Err(ParseError::MalformedSeparators(body.to_string())),
    }

    Ok((runs, separators))
}

/// A lone separator with exactly three trailing digits groups thousands,
/// unless the integer part cannot be the head of a thousands group.
fn looks_like_thousands(integer: &str, trailing: &str) -> bool {
    trailing.len() == 3 && (1..=3).contains(&integer.len()) && !integer.starts_with('0')
}

/// `1,234,567`: a 1-3 digit head followed by 3-digit groups.
fn is_western(groups: &[&str]) -> bool {
    (1..=3).contains(&groups[0].len()) && groups[1..].iter().all(|g| g.len() == 3)
}

/// `12,34,567`: a 1-2 digit head, 2-digit groups, and a final 3-digit group.
fn is_indian(groups: &[&str]) -> bool {
    let last = groups.len() - 1;
    (1..=2).contains(&groups[0].len())
        && groups[last].len() == 3
        && groups[1..last].iter().all(|g| g.len() == 2)
}

fn to_decimal(body: &str, integer: &str, fraction: Option<&str>) -> Result<Decimal, ParseError> {
    let mut digits = String::with_capacity(integer.len() + fraction.map_or(0, |f| f.len() + 1));
    digits.push_str(integer);
    if let Some(fraction) = fraction {
        digits.push('.');
        digits.push_str(fraction);
    }
    Decimal::from_str(&digits).map_err(|_| ParseError::OutOfRange(body.to_string()))
}
