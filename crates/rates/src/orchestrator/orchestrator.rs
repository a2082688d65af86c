//! Provider cascade with caching, throttling and offline fallback.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use fxlens_detect::SymbolTable;
use log::{debug, info, warn};

use super::diagnostics::{FetchDiagnostics, SkipReason};
use super::retry::{retry_with_backoff, RetryPolicy};
use super::throttle::{RequestThrottle, ThrottleConfig};
use super::validator::{RateValidator, ValidatorConfig};
use crate::cache::{CacheTier, RateCache};
use crate::errors::RateError;
use crate::models::{CurrencyPair, RateRecord};
use crate::provider::RateProvider;

/// Default budget for the whole provider cascade of one call.
pub const DEFAULT_CASCADE_TIMEOUT: Duration = Duration::from_secs(20);

/// Orchestrator configuration.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub retry: RetryPolicy,
    pub throttle: ThrottleConfig,
    pub validator: ValidatorConfig,
    /// Once elapsed, the cascade is abandoned and the offline tier is
    /// consulted. `None` lets every provider run to completion.
    pub cascade_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            throttle: ThrottleConfig::default(),
            validator: ValidatorConfig::default(),
            cascade_timeout: Some(DEFAULT_CASCADE_TIMEOUT),
        }
    }
}

type PairLocks = HashMap<CurrencyPair, Arc<tokio::sync::Mutex<()>>>;

/// Resolves exchange rates through the cache and a prioritised provider
/// cascade.
///
/// Resolution order for one call:
/// 1. `from == to` returns a synthetic rate of 1
/// 2. Fresh cache tier
/// 3. Throttle cooldown if the pair is over its request budget
/// 4. Providers by ascending priority, each under the retry policy
/// 5. Offline cache tier
/// 6. `AllProvidersExhausted`
///
/// Calls for the same pair are serialized; a caller that waited on another
/// caller's fetch is answered from the freshly populated cache.
pub struct ProviderOrchestrator {
    providers: Vec<Arc<dyn RateProvider>>,
    cache: Arc<RateCache>,
    throttle: Arc<RequestThrottle>,
    validator: RateValidator,
    retry: RetryPolicy,
    cascade_timeout: Option<Duration>,
    pair_locks: Mutex<PairLocks>,
}

impl ProviderOrchestrator {
    pub fn new(providers: Vec<Arc<dyn RateProvider>>, cache: Arc<RateCache>) -> Self {
        Self::with_config(providers, cache, OrchestratorConfig::default())
    }

    pub fn with_config(
        mut providers: Vec<Arc<dyn RateProvider>>,
        cache: Arc<RateCache>,
        config: OrchestratorConfig,
    ) -> Self {
        providers.sort_by_key(|p| p.priority());
        Self {
            providers,
            cache,
            throttle: Arc::new(RequestThrottle::new(config.throttle)),
            validator: RateValidator::with_config(config.validator),
            retry: config.retry,
            cascade_timeout: config.cascade_timeout,
            pair_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Share a request history with other orchestrators.
    pub fn with_throttle(mut self, throttle: Arc<RequestThrottle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn providers(&self) -> &[Arc<dyn RateProvider>] {
        &self.providers
    }

    pub fn cache(&self) -> &Arc<RateCache> {
        &self.cache
    }

    pub fn throttle(&self) -> &Arc<RequestThrottle> {
        &self.throttle
    }

    /// Resolve the rate for `from -> to`.
    pub async fn get_rate(&self, from: &str, to: &str) -> Result<RateRecord, RateError> {
        self.get_rate_with_diagnostics(from, to).await.0
    }

    /// Resolve the rate and report what each provider did.
    pub async fn get_rate_with_diagnostics(
        &self,
        from: &str,
        to: &str,
    ) -> (Result<RateRecord, RateError>, FetchDiagnostics) {
        let mut diagnostics = FetchDiagnostics::new();
        let result = self.resolve(from, to, &mut diagnostics).await;
        debug!("Rate {} -> {}: {}", from, to, diagnostics.summary());
        (result, diagnostics)
    }

    async fn resolve(
        &self,
        from: &str,
        to: &str,
        diagnostics: &mut FetchDiagnostics,
    ) -> Result<RateRecord, RateError> {
        let pair = CurrencyPair::new(from, to);
        if pair.from.is_empty() || pair.to.is_empty() {
            return Err(RateError::InvalidInput("currency code is empty".to_string()));
        }

        if pair.is_identity() {
            return Ok(RateRecord::identity(&pair.from, Utc::now()));
        }

        validate_codes(&pair, from, to)?;

        if let Some(record) = self.cache.get(&pair) {
            diagnostics.cache_hit = true;
            return Ok(record);
        }

        let lock = self.pair_lock(&pair);
        let result = {
            let _guard = lock.lock().await;
            self.fetch_locked(&pair, diagnostics).await
        };
        self.release_pair_lock(&pair, lock);
        result
    }

    /// Everything after the fresh-tier miss, run while holding the pair lock.
    async fn fetch_locked(
        &self,
        pair: &CurrencyPair,
        diagnostics: &mut FetchDiagnostics,
    ) -> Result<RateRecord, RateError> {
        if let Some(record) = self.cache.get(pair) {
            debug!("{} was fetched by a concurrent request", pair);
            diagnostics.cache_hit = true;
            return Ok(record);
        }

        diagnostics.throttled = self.throttle.wait_if_needed(pair).await;

        let fetched = match self.cascade_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.run_cascade(pair, diagnostics)).await {
                    Ok(fetched) => fetched,
                    Err(_) => {
                        warn!(
                            "Provider cascade for {} timed out after {:?}",
                            pair, limit
                        );
                        self.record_timeout(pair, limit, diagnostics);
                        None
                    }
                }
            }
            None => self.run_cascade(pair, diagnostics).await,
        };

        if let Some(record) = fetched {
            return Ok(record);
        }

        if let Some(record) = self.cache.get_offline(pair) {
            warn!(
                "All providers failed for {}, using offline rate fetched at {}",
                pair, record.fetched_at
            );
            diagnostics.offline_fallback = true;
            return Ok(record);
        }

        Err(RateError::AllProvidersExhausted {
            pair: pair.to_string(),
            attempts: diagnostics.failures(),
        })
    }

    /// Try each provider in order. Failures are recorded in `diagnostics`.
    async fn run_cascade(
        &self,
        pair: &CurrencyPair,
        diagnostics: &mut FetchDiagnostics,
    ) -> Option<RateRecord> {
        for provider in &self.providers {
            let provider_id = provider.id();

            if !provider.supports(pair) {
                debug!("Provider '{}' does not quote {}, skipping", provider_id, pair);
                diagnostics.record_skip(provider_id, SkipReason::UnsupportedPair);
                continue;
            }

            let outcome = retry_with_backoff(&self.retry, provider_id, |_| {
                self.throttle.record(pair);
                async move {
                    let record = provider.fetch_rate(pair).await?;
                    self.validator.validate(&record)?;
                    Ok::<_, RateError>(record)
                }
            })
            .await;

            match outcome.result {
                Ok(record) => {
                    info!(
                        "Fetched {} = {} from '{}' after {} retries",
                        pair, record.rate, provider_id, outcome.retries
                    );
                    self.cache.put(pair, record.clone(), CacheTier::Fresh);
                    diagnostics.record_success(provider_id, outcome.retries);
                    return Some(record);
                }
                Err(e) => {
                    if e.is_retryable() {
                        warn!(
                            "Provider '{}' failed for {} after {} retries: {}",
                            provider_id, pair, outcome.retries, e
                        );
                    } else {
                        info!(
                            "Provider '{}' rejected {}: {}, trying next provider",
                            provider_id, pair, e
                        );
                    }
                    diagnostics.record_error(provider_id, e.to_string(), outcome.retries);
                }
            }
        }
        None
    }

    /// Account for providers the timed-out cascade never finished with.
    fn record_timeout(
        &self,
        pair: &CurrencyPair,
        limit: Duration,
        diagnostics: &mut FetchDiagnostics,
    ) {
        let mut in_flight = true;
        for provider in self.providers.iter().filter(|p| p.supports(pair)) {
            let id = provider.id();
            if diagnostics.attempts.iter().any(|a| a.provider == id) {
                continue;
            }
            if in_flight {
                diagnostics.record_error(id, format!("Cascade timed out after {:?}", limit), 0);
                in_flight = false;
            } else {
                diagnostics.record_skip(id, SkipReason::CascadeTimeout);
            }
        }
    }

    fn lock_pair_locks(&self) -> MutexGuard<'_, PairLocks> {
        self.pair_locks.lock().unwrap_or_else(|poisoned| {
            warn!("Pair lock table mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn pair_lock(&self, pair: &CurrencyPair) -> Arc<tokio::sync::Mutex<()>> {
        self.lock_pair_locks()
            .entry(pair.clone())
            .or_default()
            .clone()
    }

    /// Drop the pair's lock once nobody else holds or waits on it.
    fn release_pair_lock(&self, pair: &CurrencyPair, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.lock_pair_locks();
        // One reference in the table, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(pair);
        }
    }
}

/// Codes must be known or look like one: three to five ASCII letters
/// (`XAF`, `USDT`, `MATIC`). Providers answer for codes they do not quote.
fn validate_codes(pair: &CurrencyPair, from: &str, to: &str) -> Result<(), RateError> {
    for (raw, code) in [(from, &pair.from), (to, &pair.to)] {
        if !SymbolTable::is_valid_currency(code) && !is_well_formed_code(code) {
            return Err(RateError::InvalidInput(format!(
                "malformed currency code '{}'",
                raw.trim()
            )));
        }
    }
    Ok(())
}

fn is_well_formed_code(code: &str) -> bool {
    (3..=5).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_uppercase())
}
