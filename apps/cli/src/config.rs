use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use fxlens_detect::detector::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_CONTEXT_RADIUS};
use fxlens_detect::{DetectorConfig, SymbolTable};
use fxlens_rates::orchestrator::{
    DEFAULT_BASE_DELAY, DEFAULT_CASCADE_TIMEOUT, DEFAULT_MAX_RETRIES,
};
use fxlens_rates::{CacheConfig, OrchestratorConfig, RetryPolicy};

const DEFAULT_BASE_CURRENCY: &str = "USD";
const DEFAULT_CACHE_FILE: &str = "./fxlens-cache.json";

pub struct Config {
    pub base_currency: String,
    pub confidence_threshold: f64,
    pub cache: CacheConfig,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// `None` when `FXLENS_TIMEOUT_MS` is 0.
    pub cascade_timeout: Option<Duration>,
    pub cache_file: PathBuf,
}

impl Config {
    /// Read the process environment. `main` loads `.env` before this runs.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparsable values fall back to defaults.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_currency = get("FXLENS_BASE_CURRENCY")
            .map(|c| c.trim().to_uppercase())
            .filter(|c| SymbolTable::is_valid_currency(c))
            .unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string());

        let confidence_threshold = parse_or(&get, "FXLENS_CONFIDENCE_THRESHOLD", DEFAULT_CONFIDENCE_THRESHOLD);
        let confidence_threshold = if (0.0..=1.0).contains(&confidence_threshold) {
            confidence_threshold
        } else {
            tracing::warn!(
                "FXLENS_CONFIDENCE_THRESHOLD {} is outside [0, 1], using {}",
                confidence_threshold,
                DEFAULT_CONFIDENCE_THRESHOLD
            );
            DEFAULT_CONFIDENCE_THRESHOLD
        };

        let defaults = CacheConfig::default();
        let cache = CacheConfig {
            fresh_ttl: Duration::from_secs(parse_or(
                &get,
                "FXLENS_FRESH_TTL_SECS",
                defaults.fresh_ttl.as_secs(),
            )),
            offline_ttl: Duration::from_secs(parse_or(
                &get,
                "FXLENS_OFFLINE_TTL_SECS",
                defaults.offline_ttl.as_secs(),
            )),
            max_entries_per_tier: parse_or(
                &get,
                "FXLENS_CACHE_MAX_ENTRIES",
                defaults.max_entries_per_tier,
            ),
        };

        let timeout_ms: u64 = parse_or(
            &get,
            "FXLENS_TIMEOUT_MS",
            DEFAULT_CASCADE_TIMEOUT.as_millis() as u64,
        );

        Self {
            base_currency,
            confidence_threshold,
            cache,
            max_retries: parse_or(&get, "FXLENS_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            retry_delay: Duration::from_millis(parse_or(
                &get,
                "FXLENS_RETRY_DELAY_MS",
                DEFAULT_BASE_DELAY.as_millis() as u64,
            )),
            cascade_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            cache_file: get("FXLENS_CACHE_FILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE)),
        }
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            confidence_threshold: self.confidence_threshold,
            context_radius: DEFAULT_CONTEXT_RADIUS,
            base_currency: self.base_currency.clone(),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: self.retry_delay,
                ..RetryPolicy::default()
            },
            cascade_timeout: self.cascade_timeout,
            ..OrchestratorConfig::default()
        }
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value '{}', using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.base_currency, "USD");
        assert_eq!(config.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(500));
        assert_eq!(config.cascade_timeout, Some(DEFAULT_CASCADE_TIMEOUT));
        assert_eq!(config.cache_file, PathBuf::from(DEFAULT_CACHE_FILE));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("FXLENS_BASE_CURRENCY", "eur"),
            ("FXLENS_CONFIDENCE_THRESHOLD", "0.85"),
            ("FXLENS_FRESH_TTL_SECS", "60"),
            ("FXLENS_OFFLINE_TTL_SECS", "3600"),
            ("FXLENS_CACHE_MAX_ENTRIES", "20"),
            ("FXLENS_MAX_RETRIES", "1"),
            ("FXLENS_RETRY_DELAY_MS", "50"),
            ("FXLENS_TIMEOUT_MS", "0"),
            ("FXLENS_CACHE_FILE", "/tmp/rates.json"),
        ]);
        assert_eq!(config.base_currency, "EUR");
        assert_eq!(config.confidence_threshold, 0.85);
        assert_eq!(config.cache.fresh_ttl, Duration::from_secs(60));
        assert_eq!(config.cache.offline_ttl, Duration::from_secs(3600));
        assert_eq!(config.cache.max_entries_per_tier, 20);
        assert_eq!(config.cascade_timeout, None);
        assert_eq!(config.cache_file, PathBuf::from("/tmp/rates.json"));

        let orchestrator = config.orchestrator_config();
        assert_eq!(orchestrator.retry.max_retries, 1);
        assert_eq!(orchestrator.retry.base_delay, Duration::from_millis(50));
        assert_eq!(config.detector_config().base_currency, "EUR");
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("FXLENS_CACHE_MAX_ENTRIES", "42");
        let config = Config::from_env();
        std::env::remove_var("FXLENS_CACHE_MAX_ENTRIES");
        assert_eq!(config.cache.max_entries_per_tier, 42);
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = config_from(&[
            ("FXLENS_BASE_CURRENCY", "dollars"),
            ("FXLENS_CONFIDENCE_THRESHOLD", "1.5"),
            ("FXLENS_MAX_RETRIES", "many"),
            ("FXLENS_FRESH_TTL_SECS", "-1"),
        ]);
        assert_eq!(config.base_currency, "USD");
        assert_eq!(config.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.cache.fresh_ttl, CacheConfig::default().fresh_ttl);
    }
}
