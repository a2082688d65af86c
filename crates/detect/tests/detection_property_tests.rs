//! Property-based integration tests for mention detection.
//!
//! These tests check properties that must hold for every input, using
//! `proptest` to generate fragments, prose and candidate lists.

use fxlens_detect::{
    CurrencyMention, MentionDetector, MentionFormat, NumberParser, OverlapResolver,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Helpers
// =============================================================================

/// Group the digits of `value` in threes with `separator`.
fn group(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

fn expected_amount(whole: u64, cents: u64) -> Decimal {
    Decimal::new((whole * 100 + cents) as i64, 2)
}

// =============================================================================
// Generators
// =============================================================================

fn arb_prefix_symbol() -> impl Strategy<Value = (&'static str, &'static str)> {
    prop_oneof![
        Just(("$", "USD")),
        Just(("US$", "USD")),
        Just(("€", "EUR")),
        Just(("£", "GBP")),
        Just(("¥", "JPY")),
        Just(("₹", "INR")),
        Just(("C$", "CAD")),
        Just(("R$", "BRL")),
    ]
}

fn arb_fiat_code() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("USD"),
        Just("EUR"),
        Just("GBP"),
        Just("JPY"),
        Just("CHF"),
        Just("SEK"),
    ]
}

fn arb_candidate() -> impl Strategy<Value = CurrencyMention> {
    (0usize..60, 1usize..12, 0u8..=10).prop_map(|(start, len, tenths)| CurrencyMention {
        amount: Decimal::ONE,
        currency_code: "USD".to_string(),
        source_text: String::new(),
        range: start..start + len,
        format: MentionFormat::SymbolPrefix,
        confidence: f64::from(tenths) / 10.0,
    })
}

fn arb_prose_token() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(|s| s),
        (1u64..100_000).prop_map(|n| n.to_string()),
        (1u64..10_000_000).prop_map(|n| group(n, ',')),
        Just("$".to_string()),
        Just("€".to_string()),
        Just("USD".to_string()),
        Just("EUR".to_string()),
        Just("dollars".to_string()),
        Just("BTC".to_string()),
        Just("price".to_string()),
        Just("Japan".to_string()),
        Just(",".to_string()),
    ]
}

fn arb_prose() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_prose_token(), 0..20).prop_map(|tokens| tokens.join(" "))
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A lone symbol-prefix fragment yields exactly one mention that spans
    /// the whole fragment.
    #[test]
    fn prop_symbol_prefix_fragment_spans_input(
        (symbol, code) in arb_prefix_symbol(),
        whole in 0u64..10_000_000,
        cents in 0u64..100,
    ) {
        let fragment = format!("{}{}.{:02}", symbol, group(whole, ','), cents);
        let found = MentionDetector::new().detect(&fragment);

        prop_assert_eq!(found.len(), 1, "{}: {:?}", fragment, found);
        prop_assert_eq!(found[0].range.clone(), 0..fragment.len());
        prop_assert_eq!(found[0].currency_code.as_str(), code);
        prop_assert_eq!(found[0].amount, expected_amount(whole, cents));
    }

    /// European-formatted amounts with a trailing code are read correctly.
    #[test]
    fn prop_code_suffix_fragment_european_format(
        code in arb_fiat_code(),
        whole in 0u64..10_000_000,
        cents in 0u64..100,
    ) {
        let fragment = format!("{},{:02} {}", group(whole, '.'), cents, code);
        let found = MentionDetector::new().detect(&fragment);

        prop_assert_eq!(found.len(), 1, "{}: {:?}", fragment, found);
        prop_assert_eq!(found[0].range.clone(), 0..fragment.len());
        prop_assert_eq!(found[0].currency_code.as_str(), code);
        prop_assert_eq!(found[0].amount, expected_amount(whole, cents));
    }

    /// Text made only of punctuation and whitespace has no mentions.
    #[test]
    fn prop_punctuation_only_yields_nothing(text in r"[!-/:-@\[-`{-~ ]{0,40}") {
        prop_assert!(MentionDetector::new().detect(&text).is_empty());
        prop_assert!(MentionDetector::new().scan(&text).is_empty());
    }

    /// Every reported range slices back to its source text on char
    /// boundaries.
    #[test]
    fn prop_ranges_slice_source_text(text in arb_prose()) {
        for mention in MentionDetector::new().detect(&text) {
            prop_assert!(text.is_char_boundary(mention.range.start));
            prop_assert!(text.is_char_boundary(mention.range.end));
            prop_assert_eq!(&text[mention.range.clone()], mention.source_text.as_str());
            prop_assert!(mention.confidence >= 0.7 && mention.confidence <= 1.0);
        }
    }

    /// Scanned mentions never overlap and are ranked best first.
    #[test]
    fn prop_scan_output_is_disjoint_and_ranked(text in arb_prose()) {
        let report = MentionDetector::new().scan(&text);
        for (i, a) in report.mentions.iter().enumerate() {
            for b in &report.mentions[i + 1..] {
                prop_assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
                prop_assert!(a.confidence >= b.confidence);
            }
        }
        prop_assert_eq!(report.multiple_mentions, report.mentions.len() > 1);
    }

    /// Resolution is idempotent and every dropped candidate overlaps a kept
    /// candidate of at least the same confidence.
    #[test]
    fn prop_overlap_resolution_is_idempotent(
        candidates in proptest::collection::vec(arb_candidate(), 0..25),
    ) {
        let once = OverlapResolver::resolve(candidates.clone());
        let twice = OverlapResolver::resolve(once.clone());
        prop_assert_eq!(&once, &twice);

        for dropped in candidates.iter().filter(|c| !once.contains(c)) {
            prop_assert!(once
                .iter()
                .any(|kept| kept.overlaps(dropped) && kept.confidence >= dropped.confidence));
        }
    }

    /// Western-grouped integers parse back to their value with any grouping
    /// character.
    #[test]
    fn prop_grouped_integers_parse(
        value in 0u64..1_000_000_000_000,
        separator in prop_oneof![Just(','), Just('.'), Just('\''), Just('\u{00A0}')],
    ) {
        let text = group(value, separator);
        prop_assert_eq!(NumberParser::parse(&text), Ok(Decimal::from(value)));
    }
}
