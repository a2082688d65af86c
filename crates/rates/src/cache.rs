//! Two-tier exchange rate cache.
//!
//! - The **fresh** tier holds rates for a short TTL and answers normal
//!   lookups.
//! - The **offline** tier holds the same rates for a long TTL and is only
//!   consulted after every provider has failed.
//!
//! A fresh `put` always refreshes the offline tier too, and the offline TTL
//! is never shorter than the fresh one, so for any pair the offline entry
//! outlives the fresh entry. Each tier is bounded independently and evicts
//! its least recently used entry when full.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::clock::{to_chrono, Clock, SystemClock};
use crate::errors::RateError;
use crate::models::{CurrencyPair, RateRecord};
use crate::store::KeyValueStore;

/// Key under which the cache snapshot is stored.
pub const CACHE_STORAGE_KEY: &str = "fxlens.rate_cache";

const SNAPSHOT_VERSION: u32 = 1;

/// Default fresh tier TTL: 15 minutes.
pub const DEFAULT_FRESH_TTL: Duration = Duration::from_secs(15 * 60);

/// Default offline tier TTL: 24 hours.
pub const DEFAULT_OFFLINE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default capacity of each tier.
pub const DEFAULT_MAX_ENTRIES_PER_TIER: usize = 500;

/// Which tier a record lives in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTier {
    Fresh,
    Offline,
}

/// Cache configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheConfig {
    pub fresh_ttl: Duration,
    pub offline_ttl: Duration,
    pub max_entries_per_tier: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fresh_ttl: DEFAULT_FRESH_TTL,
            offline_ttl: DEFAULT_OFFLINE_TTL,
            max_entries_per_tier: DEFAULT_MAX_ENTRIES_PER_TIER,
        }
    }
}

impl CacheConfig {
    /// Clamp the offline TTL to at least the fresh TTL and capacity to at
    /// least one entry.
    fn normalized(mut self) -> Self {
        if self.offline_ttl < self.fresh_ttl {
            warn!(
                "Offline TTL {:?} is shorter than fresh TTL {:?}, clamping",
                self.offline_ttl, self.fresh_ttl
            );
            self.offline_ttl = self.fresh_ttl;
        }
        self.max_entries_per_tier = self.max_entries_per_tier.max(1);
        self
    }
}

/// Point-in-time cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub fresh_entries: usize,
    pub offline_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Persisted form of both tiers.
#[derive(Debug, Serialize, Deserialize)]
struct CacheSnapshot {
    version: u32,
    fresh: Vec<RateRecord>,
    offline: Vec<RateRecord>,
}

#[derive(Debug)]
struct CacheEntry {
    record: RateRecord,
    last_access: u64,
}

#[derive(Debug, Default)]
struct Tier {
    entries: HashMap<CurrencyPair, CacheEntry>,
}

impl Tier {
    /// Drop least recently used entries until at most `max` remain.
    fn evict_lru(&mut self, max: usize, tier: CacheTier) -> u64 {
        let mut evicted = 0;
        while self.entries.len() > max {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_access)
                .map(|(pair, _)| pair.clone())
            else {
                break;
            };
            self.entries.remove(&oldest);
            debug!("Evicted least recently used {:?} entry {}", tier, oldest);
            evicted += 1;
        }
        evicted
    }

    fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.record.is_expired(now));
        before - self.entries.len()
    }

    fn records(&self) -> Vec<RateRecord> {
        let mut records: Vec<_> = self.entries.values().map(|e| e.record.clone()).collect();
        records.sort_by(|a, b| {
            (&a.from_currency, &a.to_currency).cmp(&(&b.from_currency, &b.to_currency))
        });
        records
    }
}

#[derive(Debug, Default)]
struct CacheState {
    fresh: Tier,
    offline: Tier,
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheState {
    fn tier_mut(&mut self, tier: CacheTier) -> &mut Tier {
        match tier {
            CacheTier::Fresh => &mut self.fresh,
            CacheTier::Offline => &mut self.offline,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn insert(&mut self, tier: CacheTier, pair: CurrencyPair, record: RateRecord, max: usize) {
        let last_access = self.next_tick();
        let slot = self.tier_mut(tier);
        slot.entries.insert(
            pair,
            CacheEntry {
                record,
                last_access,
            },
        );
        let evicted = slot.evict_lru(max, tier);
        self.evictions += evicted;
    }
}

/// Two-tier, capacity-bounded rate cache.
///
/// All operations take a short internal lock and never await while holding
/// it, so a cancelled caller cannot leave a half-written record behind.
pub struct RateCache {
    state: Mutex<CacheState>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl RateCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            config: config.normalized(),
            clock,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Lock the cache state, recovering from poison if necessary.
    ///
    /// Every mutation completes under a single lock acquisition, so a
    /// poisoned guard still holds a consistent map.
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Rate cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Fresh-tier lookup. Expired entries are purged and reported as a miss.
    pub fn get(&self, pair: &CurrencyPair) -> Option<RateRecord> {
        self.lookup(pair, CacheTier::Fresh)
    }

    /// Offline-tier lookup. The returned record is flagged `offline`.
    pub fn get_offline(&self, pair: &CurrencyPair) -> Option<RateRecord> {
        self.lookup(pair, CacheTier::Offline)
    }

    fn lookup(&self, pair: &CurrencyPair, tier: CacheTier) -> Option<RateRecord> {
        let now = self.clock.now();
        let mut state = self.lock_state();
        let tick = state.next_tick();

        let found = {
            let entries = &mut state.tier_mut(tier).entries;
            let expired = entries.get(pair).map(|e| e.record.is_expired(now));
            match expired {
                Some(true) => {
                    entries.remove(pair);
                    debug!("Purged expired {:?} entry {}", tier, pair);
                    None
                }
                Some(false) => entries.get_mut(pair).map(|entry| {
                    entry.last_access = tick;
                    let mut record = entry.record.clone();
                    record.cached = true;
                    record.offline = tier == CacheTier::Offline;
                    record
                }),
                None => None,
            }
        };

        if found.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        found
    }

    /// Store a record. The expiry is derived from the tier TTL.
    ///
    /// A fresh put also refreshes the offline tier; an offline put leaves
    /// the fresh tier alone.
    pub fn put(&self, pair: &CurrencyPair, record: RateRecord, tier: CacheTier) {
        let now = self.clock.now();
        let max = self.config.max_entries_per_tier;
        let mut state = self.lock_state();

        if tier == CacheTier::Fresh {
            let fresh = stamp(record.clone(), now, self.config.fresh_ttl);
            state.insert(CacheTier::Fresh, pair.clone(), fresh, max);
        }
        let offline = stamp(record, now, self.config.offline_ttl);
        state.insert(CacheTier::Offline, pair.clone(), offline, max);
    }

    /// Remove expired entries from both tiers. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock_state();
        let fresh = state.fresh.evict_expired(now);
        let offline = state.offline.evict_expired(now);
        if fresh + offline > 0 {
            debug!(
                "Expiry sweep removed {} fresh and {} offline entries",
                fresh, offline
            );
        }
        fresh + offline
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock_state();
        CacheStats {
            fresh_entries: state.fresh.entries.len(),
            offline_entries: state.offline.entries.len(),
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
        }
    }

    pub fn clear(&self) {
        let mut state = self.lock_state();
        state.fresh.entries.clear();
        state.offline.entries.clear();
    }

    /// Serialize both tiers to a JSON blob.
    pub fn snapshot_for_persistence(&self) -> Result<String, RateError> {
        let snapshot = {
            let state = self.lock_state();
            CacheSnapshot {
                version: SNAPSHOT_VERSION,
                fresh: state.fresh.records(),
                offline: state.offline.records(),
            }
        };
        serde_json::to_string(&snapshot).map_err(|e| RateError::Storage(e.to_string()))
    }

    /// Load a blob produced by [`snapshot_for_persistence`](Self::snapshot_for_persistence).
    ///
    /// Records keep their stored expiry; already-expired ones are skipped.
    /// A corrupt blob is logged and treated as an empty cache. Returns the
    /// number of records restored.
    pub fn restore_from_persistence(&self, blob: &str) -> usize {
        let snapshot = match decode_snapshot(blob) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Ignoring persisted rate cache: {}", e);
                return 0;
            }
        };

        let now = self.clock.now();
        let max = self.config.max_entries_per_tier;
        let mut state = self.lock_state();
        let mut restored = 0;

        for (tier, records) in [
            (CacheTier::Offline, snapshot.offline),
            (CacheTier::Fresh, snapshot.fresh),
        ] {
            for record in records {
                if record.is_expired(now) {
                    continue;
                }
                let mut record = record;
                record.cached = false;
                record.offline = false;
                state.insert(tier, record.pair(), record, max);
                restored += 1;
            }
        }

        info!("Restored {} cached rates", restored);
        restored
    }

    /// Write a snapshot to `store` under [`CACHE_STORAGE_KEY`].
    pub async fn persist(&self, store: &dyn KeyValueStore) -> Result<(), RateError> {
        let blob = self.snapshot_for_persistence()?;
        store
            .set(HashMap::from([(CACHE_STORAGE_KEY.to_string(), blob)]))
            .await
    }

    /// Restore from `store`. A missing key restores nothing.
    pub async fn restore(&self, store: &dyn KeyValueStore) -> Result<usize, RateError> {
        let values = store.get(&[CACHE_STORAGE_KEY.to_string()]).await?;
        Ok(values
            .get(CACHE_STORAGE_KEY)
            .map_or(0, |blob| self.restore_from_persistence(blob)))
    }

    /// Run [`evict_expired`](Self::evict_expired) every `interval` on the
    /// tokio runtime. The task ends once the cache is dropped.
    pub fn spawn_expiry_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    debug!("Rate cache dropped, stopping expiry sweeper");
                    break;
                };
                cache.evict_expired();
            }
        })
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

fn stamp(mut record: RateRecord, now: DateTime<Utc>, ttl: Duration) -> RateRecord {
    record.expires_at = now + to_chrono(ttl);
    record.cached = false;
    record.offline = false;
    record
}

fn decode_snapshot(blob: &str) -> Result<CacheSnapshot, RateError> {
    let snapshot: CacheSnapshot = serde_json::from_str(blob)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(RateError::CacheCorrupt(format!(
            "unsupported snapshot version {}",
            snapshot.version
        )));
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn pair(from: &str, to: &str) -> CurrencyPair {
        CurrencyPair::new(from, to)
    }

    fn record(p: &CurrencyPair, clock: &ManualClock) -> RateRecord {
        RateRecord::new(p, dec!(1.0850), "FRANKFURTER", clock.now())
    }

    fn cache_with(config: CacheConfig) -> (RateCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = RateCache::with_clock(config, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_roundtrip_before_ttl() {
        let (cache, clock) = cache_with(CacheConfig::default());
        let eur_usd = pair("EUR", "USD");
        let stored = record(&eur_usd, &clock);
        cache.put(&eur_usd, stored.clone(), CacheTier::Fresh);

        clock.advance(Duration::from_secs(14 * 60));
        let read = cache.get(&eur_usd).unwrap();
        assert_eq!(read.rate, stored.rate);
        assert_eq!(read.source, stored.source);
        assert_eq!(read.fetched_at, stored.fetched_at);
        assert!(read.cached);
        assert!(!read.offline);
    }

    #[test]
    fn test_expired_entry_is_purged() {
        let (cache, clock) = cache_with(CacheConfig::default());
        let eur_usd = pair("EUR", "USD");
        cache.put(&eur_usd, record(&eur_usd, &clock), CacheTier::Fresh);

        clock.advance(DEFAULT_FRESH_TTL);
        assert!(cache.get(&eur_usd).is_none());
        assert_eq!(cache.stats().fresh_entries, 0);

        // The offline copy outlives the fresh one.
        let offline = cache.get_offline(&eur_usd).unwrap();
        assert!(offline.offline);
        assert!(offline.cached);
    }

    #[test]
    fn test_fresh_put_refreshes_offline_tier() {
        let (cache, clock) = cache_with(CacheConfig::default());
        let gbp_jpy = pair("GBP", "JPY");
        cache.put(&gbp_jpy, record(&gbp_jpy, &clock), CacheTier::Fresh);

        let fresh = cache.get(&gbp_jpy).unwrap();
        let offline = cache.get_offline(&gbp_jpy).unwrap();
        assert!(offline.expires_at >= fresh.expires_at);
        assert_eq!(
            offline.expires_at - fresh.expires_at,
            to_chrono(DEFAULT_OFFLINE_TTL - DEFAULT_FRESH_TTL)
        );
    }

    #[test]
    fn test_offline_put_leaves_fresh_tier_alone() {
        let (cache, clock) = cache_with(CacheConfig::default());
        let usd_chf = pair("USD", "CHF");
        cache.put(&usd_chf, record(&usd_chf, &clock), CacheTier::Offline);

        assert!(cache.get(&usd_chf).is_none());
        assert!(cache.get_offline(&usd_chf).is_some());
    }

    #[test]
    fn test_offline_tier_expires() {
        let (cache, clock) = cache_with(CacheConfig::default());
        let eur_usd = pair("EUR", "USD");
        cache.put(&eur_usd, record(&eur_usd, &clock), CacheTier::Fresh);

        clock.advance(DEFAULT_OFFLINE_TTL + Duration::from_secs(1));
        assert!(cache.get_offline(&eur_usd).is_none());
        assert_eq!(cache.stats().offline_entries, 0);
    }

    #[test]
    fn test_lru_eviction_per_tier() {
        let (cache, clock) = cache_with(CacheConfig {
            max_entries_per_tier: 2,
            ..CacheConfig::default()
        });
        let a = pair("EUR", "USD");
        let b = pair("GBP", "USD");
        let c = pair("JPY", "USD");

        cache.put(&a, record(&a, &clock), CacheTier::Fresh);
        cache.put(&b, record(&b, &clock), CacheTier::Fresh);
        assert!(cache.get(&a).is_some());
        cache.put(&c, record(&c, &clock), CacheTier::Fresh);

        assert!(cache.get(&a).is_some());
        assert!(cache.get(&b).is_none());
        assert!(cache.get(&c).is_some());

        let stats = cache.stats();
        assert_eq!(stats.fresh_entries, 2);
        assert_eq!(stats.offline_entries, 2);
        assert!(stats.evictions >= 2);
    }

    #[test]
    fn test_evict_expired_counts_both_tiers() {
        let (cache, clock) = cache_with(CacheConfig::default());
        let a = pair("EUR", "USD");
        let b = pair("GBP", "USD");
        cache.put(&a, record(&a, &clock), CacheTier::Fresh);
        cache.put(&b, record(&b, &clock), CacheTier::Offline);

        clock.advance(DEFAULT_FRESH_TTL);
        assert_eq!(cache.evict_expired(), 1);

        clock.advance(DEFAULT_OFFLINE_TTL);
        assert_eq!(cache.evict_expired(), 2);
        assert_eq!(cache.stats().offline_entries, 0);
    }

    #[test]
    fn test_offline_ttl_is_clamped() {
        let cache = RateCache::new(CacheConfig {
            fresh_ttl: Duration::from_secs(600),
            offline_ttl: Duration::from_secs(60),
            max_entries_per_tier: 0,
        });
        assert_eq!(cache.config().offline_ttl, Duration::from_secs(600));
        assert_eq!(cache.config().max_entries_per_tier, 1);
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let (cache, clock) = cache_with(CacheConfig::default());
        let a = pair("EUR", "USD");
        let b = pair("BTC", "USD");
        cache.put(&a, record(&a, &clock), CacheTier::Fresh);
        cache.put(&b, record(&b, &clock), CacheTier::Offline);
        let blob = cache.snapshot_for_persistence().unwrap();

        let restored = RateCache::with_clock(CacheConfig::default(), clock.clone());
        assert_eq!(restored.restore_from_persistence(&blob), 3);
        assert_eq!(restored.get(&a).unwrap().rate, dec!(1.0850));
        assert!(restored.get(&b).is_none());
        assert!(restored.get_offline(&b).is_some());
    }

    #[test]
    fn test_restore_keeps_full_rate_precision() {
        let (cache, clock) = cache_with(CacheConfig::default());
        let usd_btc = pair("USD", "BTC");
        let rate = dec!(0.0000155949581876543210987654);
        cache.put(
            &usd_btc,
            RateRecord::new(&usd_btc, rate, "COINGECKO", clock.now()),
            CacheTier::Fresh,
        );
        let blob = cache.snapshot_for_persistence().unwrap();

        let restored = RateCache::with_clock(CacheConfig::default(), clock.clone());
        restored.restore_from_persistence(&blob);
        assert_eq!(restored.get(&usd_btc).unwrap().rate, rate);
        assert_eq!(restored.get_offline(&usd_btc).unwrap().rate, rate);
    }

    #[test]
    fn test_restore_skips_expired_records() {
        let (cache, clock) = cache_with(CacheConfig::default());
        let a = pair("EUR", "USD");
        cache.put(&a, record(&a, &clock), CacheTier::Fresh);
        let blob = cache.snapshot_for_persistence().unwrap();

        clock.advance(Duration::from_secs(60 * 60));
        let restored = RateCache::with_clock(CacheConfig::default(), clock.clone());
        assert_eq!(restored.restore_from_persistence(&blob), 1);
        assert!(restored.get(&a).is_none());
        assert!(restored.get_offline(&a).is_some());
    }

    #[test]
    fn test_corrupt_blob_is_treated_as_empty() {
        let cache = RateCache::default();
        assert_eq!(cache.restore_from_persistence("{not json"), 0);
        assert_eq!(
            cache.restore_from_persistence(r#"{"version":99,"fresh":[],"offline":[]}"#),
            0
        );
        assert_eq!(cache.stats().fresh_entries, 0);
        assert!(matches!(
            decode_snapshot("[]"),
            Err(RateError::CacheCorrupt(_))
        ));
    }

    #[tokio::test]
    async fn test_persist_and_restore_through_store() {
        let (cache, clock) = cache_with(CacheConfig::default());
        let a = pair("EUR", "USD");
        cache.put(&a, record(&a, &clock), CacheTier::Fresh);

        let store = MemoryStore::new();
        cache.persist(&store).await.unwrap();

        let restored = RateCache::with_clock(CacheConfig::default(), clock.clone());
        assert_eq!(restored.restore(&store).await.unwrap(), 2);
        assert!(restored.get(&a).is_some());

        let empty = RateCache::default();
        assert_eq!(empty.restore(&MemoryStore::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expiry_sweeper_removes_stale_entries() {
        let clock = Arc::new(ManualClock::default());
        let cache = Arc::new(RateCache::with_clock(CacheConfig::default(), clock.clone()));
        let a = pair("EUR", "USD");
        cache.put(&a, RateRecord::new(&a, dec!(1.08), "TEST", clock.now()), CacheTier::Fresh);

        clock.advance(DEFAULT_OFFLINE_TTL);
        let handle = cache.spawn_expiry_sweeper(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let stats = cache.stats();
        assert_eq!(stats.fresh_entries, 0);
        assert_eq!(stats.offline_entries, 0);
        handle.abort();
    }
}
