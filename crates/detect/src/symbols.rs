//! Static currency lookup tables.
//!
//! Maps currency symbols, spoken names and ISO-style codes to currency
//! identifiers. Ambiguous bare symbols resolve to a single default
//! regardless of locale: `$` is USD (not CAD/AUD), `¥` is JPY (not CNY) and
//! `kr` is SEK (not NOK/DKK). Prefixed variants such as `C$` or `CN¥`
//! resolve precisely.
//!
//! Cryptocurrencies live in a separate table that also carries decimal
//! precision and the CoinGecko asset id used by the rate providers.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;

/// Cryptocurrency metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CryptoAsset {
    /// Ticker code (e.g., "BTC").
    pub code: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Single-glyph symbol, if the asset has one.
    pub glyph: Option<&'static str>,
    /// Number of decimal places the asset is divisible into.
    pub decimals: u32,
    /// CoinGecko asset id.
    pub coingecko_id: &'static str,
    /// Lowercase spoken names.
    pub aliases: &'static [&'static str],
}

const CRYPTO_ASSETS: &[CryptoAsset] = &[
    CryptoAsset {
        code: "BTC",
        name: "Bitcoin",
        glyph: Some("₿"),
        decimals: 8,
        coingecko_id: "bitcoin",
        aliases: &["bitcoin", "bitcoins"],
    },
    CryptoAsset {
        code: "ETH",
        name: "Ethereum",
        glyph: Some("Ξ"),
        decimals: 18,
        coingecko_id: "ethereum",
        aliases: &["ether", "ethereum"],
    },
    CryptoAsset {
        code: "LTC",
        name: "Litecoin",
        glyph: Some("Ł"),
        decimals: 8,
        coingecko_id: "litecoin",
        aliases: &["litecoin", "litecoins"],
    },
    CryptoAsset {
        code: "DOGE",
        name: "Dogecoin",
        glyph: Some("Ð"),
        decimals: 8,
        coingecko_id: "dogecoin",
        aliases: &["dogecoin"],
    },
    CryptoAsset {
        code: "XRP",
        name: "XRP",
        glyph: None,
        decimals: 6,
        coingecko_id: "ripple",
        aliases: &["ripple"],
    },
    CryptoAsset {
        code: "ADA",
        name: "Cardano",
        glyph: None,
        decimals: 6,
        coingecko_id: "cardano",
        aliases: &["cardano"],
    },
    CryptoAsset {
        code: "SOL",
        name: "Solana",
        glyph: None,
        decimals: 9,
        coingecko_id: "solana",
        aliases: &["solana"],
    },
    CryptoAsset {
        code: "DOT",
        name: "Polkadot",
        glyph: None,
        decimals: 10,
        coingecko_id: "polkadot",
        aliases: &["polkadot"],
    },
    CryptoAsset {
        code: "BNB",
        name: "BNB",
        glyph: None,
        decimals: 18,
        coingecko_id: "binancecoin",
        aliases: &[],
    },
    CryptoAsset {
        code: "USDT",
        name: "Tether",
        glyph: None,
        decimals: 6,
        coingecko_id: "tether",
        aliases: &["tether"],
    },
    CryptoAsset {
        code: "USDC",
        name: "USD Coin",
        glyph: None,
        decimals: 6,
        coingecko_id: "usd-coin",
        aliases: &[],
    },
    CryptoAsset {
        code: "XMR",
        name: "Monero",
        glyph: None,
        decimals: 12,
        coingecko_id: "monero",
        aliases: &["monero"],
    },
    CryptoAsset {
        code: "TRX",
        name: "TRON",
        glyph: None,
        decimals: 6,
        coingecko_id: "tron",
        aliases: &[],
    },
    CryptoAsset {
        code: "AVAX",
        name: "Avalanche",
        glyph: None,
        decimals: 18,
        coingecko_id: "avalanche-2",
        aliases: &[],
    },
    CryptoAsset {
        code: "LINK",
        name: "Chainlink",
        glyph: None,
        decimals: 18,
        coingecko_id: "chainlink",
        aliases: &["chainlink"],
    },
];

/// ISO 4217 codes recognised as fiat currencies.
const FIAT_CODES: &[&str] = &[
    "AED", "ARS", "AUD", "AZN", "BDT", "BGN", "BHD", "BRL", "CAD", "CHF", "CLP", "CNY", "COP",
    "CRC", "CZK", "DKK", "EGP", "EUR", "GBP", "GEL", "GHS", "HKD", "HUF", "IDR", "ILS", "INR",
    "ISK", "JOD", "JPY", "KES", "KRW", "KWD", "KZT", "LKR", "MAD", "MXN", "MYR", "NGN", "NOK",
    "NZD", "OMR", "PEN", "PHP", "PKR", "PLN", "PYG", "QAR", "RON", "RSD", "RUB", "SAR", "SEK",
    "SGD", "THB", "TRY", "TWD", "UAH", "USD", "UYU", "VND", "ZAR",
];

/// Currency symbols, including region-prefixed dollar and yen variants.
const FIAT_SYMBOLS: &[(&str, &str)] = &[
    ("US$", "USD"),
    ("$", "USD"),
    ("C$", "CAD"),
    ("CA$", "CAD"),
    ("A$", "AUD"),
    ("AU$", "AUD"),
    ("NZ$", "NZD"),
    ("HK$", "HKD"),
    ("S$", "SGD"),
    ("R$", "BRL"),
    ("MX$", "MXN"),
    ("NT$", "TWD"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("E£", "EGP"),
    ("¥", "JPY"),
    ("￥", "JPY"),
    ("JP¥", "JPY"),
    ("CN¥", "CNY"),
    ("元", "CNY"),
    ("₹", "INR"),
    ("Rs.", "INR"),
    ("Rs", "INR"),
    ("₩", "KRW"),
    ("₽", "RUB"),
    ("₺", "TRY"),
    ("₪", "ILS"),
    ("₫", "VND"),
    ("₱", "PHP"),
    ("₦", "NGN"),
    ("₴", "UAH"),
    ("฿", "THB"),
    ("₡", "CRC"),
    ("₲", "PYG"),
    ("₵", "GHS"),
    ("₸", "KZT"),
    ("₼", "AZN"),
    ("₾", "GEL"),
    ("zł", "PLN"),
    ("kr", "SEK"),
    ("Kč", "CZK"),
    ("Ft", "HUF"),
    ("RM", "MYR"),
    ("Rp", "IDR"),
];

/// Spoken currency names, lowercase.
const FIAT_WORDS: &[(&str, &str)] = &[
    ("dollar", "USD"),
    ("dollars", "USD"),
    ("bucks", "USD"),
    ("us dollar", "USD"),
    ("us dollars", "USD"),
    ("american dollars", "USD"),
    ("canadian dollar", "CAD"),
    ("canadian dollars", "CAD"),
    ("australian dollar", "AUD"),
    ("australian dollars", "AUD"),
    ("new zealand dollar", "NZD"),
    ("new zealand dollars", "NZD"),
    ("hong kong dollar", "HKD"),
    ("hong kong dollars", "HKD"),
    ("singapore dollar", "SGD"),
    ("singapore dollars", "SGD"),
    ("taiwan dollars", "TWD"),
    ("new taiwan dollars", "TWD"),
    ("euro", "EUR"),
    ("euros", "EUR"),
    ("pound", "GBP"),
    ("pounds", "GBP"),
    ("sterling", "GBP"),
    ("pounds sterling", "GBP"),
    ("british pound", "GBP"),
    ("british pounds", "GBP"),
    ("egyptian pound", "EGP"),
    ("egyptian pounds", "EGP"),
    ("yen", "JPY"),
    ("japanese yen", "JPY"),
    ("yuan", "CNY"),
    ("chinese yuan", "CNY"),
    ("renminbi", "CNY"),
    ("rmb", "CNY"),
    ("rupee", "INR"),
    ("rupees", "INR"),
    ("indian rupee", "INR"),
    ("indian rupees", "INR"),
    ("pakistani rupee", "PKR"),
    ("pakistani rupees", "PKR"),
    ("won", "KRW"),
    ("korean won", "KRW"),
    ("south korean won", "KRW"),
    ("ruble", "RUB"),
    ("rubles", "RUB"),
    ("rouble", "RUB"),
    ("roubles", "RUB"),
    ("franc", "CHF"),
    ("francs", "CHF"),
    ("swiss franc", "CHF"),
    ("swiss francs", "CHF"),
    ("peso", "MXN"),
    ("pesos", "MXN"),
    ("mexican peso", "MXN"),
    ("mexican pesos", "MXN"),
    ("argentine pesos", "ARS"),
    ("chilean pesos", "CLP"),
    ("colombian pesos", "COP"),
    ("philippine pesos", "PHP"),
    ("reais", "BRL"),
    ("brazilian real", "BRL"),
    ("brazilian reais", "BRL"),
    ("lira", "TRY"),
    ("turkish lira", "TRY"),
    ("krona", "SEK"),
    ("kronor", "SEK"),
    ("swedish krona", "SEK"),
    ("swedish kronor", "SEK"),
    ("krone", "NOK"),
    ("kroner", "NOK"),
    ("norwegian krone", "NOK"),
    ("norwegian kroner", "NOK"),
    ("danish krone", "DKK"),
    ("danish kroner", "DKK"),
    ("zloty", "PLN"),
    ("zlotys", "PLN"),
    ("złoty", "PLN"),
    ("baht", "THB"),
    ("rand", "ZAR"),
    ("south african rand", "ZAR"),
    ("shekel", "ILS"),
    ("shekels", "ILS"),
    ("dirham", "AED"),
    ("dirhams", "AED"),
    ("riyal", "SAR"),
    ("riyals", "SAR"),
    ("forint", "HUF"),
    ("forints", "HUF"),
    ("koruna", "CZK"),
    ("ringgit", "MYR"),
    ("rupiah", "IDR"),
    ("hryvnia", "UAH"),
    ("naira", "NGN"),
];

lazy_static! {
    static ref FIAT_CODE_SET: HashSet<&'static str> = FIAT_CODES.iter().copied().collect();
    static ref SYMBOL_MAP: HashMap<&'static str, &'static str> =
        FIAT_SYMBOLS.iter().copied().collect();
    static ref WORD_MAP: HashMap<&'static str, &'static str> = FIAT_WORDS.iter().copied().collect();
    static ref CRYPTO_BY_CODE: HashMap<&'static str, &'static CryptoAsset> =
        CRYPTO_ASSETS.iter().map(|a| (a.code, a)).collect();
    static ref CRYPTO_BY_TOKEN: HashMap<&'static str, &'static CryptoAsset> = CRYPTO_ASSETS
        .iter()
        .flat_map(|a| {
            a.glyph
                .into_iter()
                .chain(a.aliases.iter().copied())
                .map(move |token| (token, a))
        })
        .collect();
}

/// Process-wide, read-only currency lookup.
pub struct SymbolTable;

impl SymbolTable {
    /// Map a symbol, spoken name, or code to a currency identifier.
    ///
    /// Symbols are matched exactly, names case-insensitively, and codes
    /// case-insensitively against the fiat and crypto tables.
    ///
    /// ```
    /// use fxlens_detect::SymbolTable;
    ///
    /// assert_eq!(SymbolTable::symbol_or_word_to_currency("$"), Some("USD"));
    /// assert_eq!(SymbolTable::symbol_or_word_to_currency("Euros"), Some("EUR"));
    /// assert_eq!(SymbolTable::symbol_or_word_to_currency("₿"), Some("BTC"));
    /// assert_eq!(SymbolTable::symbol_or_word_to_currency("widgets"), None);
    /// ```
    pub fn symbol_or_word_to_currency(token: &str) -> Option<&'static str> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        if let Some(code) = SYMBOL_MAP.get(token) {
            return Some(*code);
        }
        if let Some(asset) = CRYPTO_BY_TOKEN.get(token) {
            return Some(asset.code);
        }

        let lower = token.to_lowercase();
        if let Some(code) = WORD_MAP.get(lower.as_str()) {
            return Some(*code);
        }
        if let Some(asset) = CRYPTO_BY_TOKEN.get(lower.as_str()) {
            return Some(asset.code);
        }

        let upper = token.to_uppercase();
        FIAT_CODE_SET
            .get(upper.as_str())
            .copied()
            .or_else(|| CRYPTO_BY_CODE.get(upper.as_str()).map(|a| a.code))
    }

    /// Whether `code` is a known fiat or crypto currency code (exact case).
    pub fn is_valid_currency(code: &str) -> bool {
        Self::is_fiat(code) || CRYPTO_BY_CODE.contains_key(code)
    }

    /// Whether `code` is a known fiat currency code.
    pub fn is_fiat(code: &str) -> bool {
        FIAT_CODE_SET.contains(code)
    }

    /// Look up crypto metadata by code.
    pub fn crypto_asset(code: &str) -> Option<&'static CryptoAsset> {
        CRYPTO_BY_CODE.get(code).copied()
    }

    /// All known crypto assets.
    pub fn crypto_assets() -> &'static [CryptoAsset] {
        CRYPTO_ASSETS
    }

    /// All fiat codes.
    pub fn fiat_codes() -> &'static [&'static str] {
        FIAT_CODES
    }

    /// All fiat symbols with their currency codes.
    pub fn fiat_symbols() -> &'static [(&'static str, &'static str)] {
        FIAT_SYMBOLS
    }

    /// All spoken fiat names (lowercase) with their currency codes.
    pub fn fiat_words() -> &'static [(&'static str, &'static str)] {
        FIAT_WORDS
    }
}
