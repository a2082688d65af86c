//! Per-pair request throttle.
//!
//! Keeps a sliding window of request timestamps per currency pair. When a
//! pair has seen more than `max_requests` attempts inside `window`, the next
//! caller sleeps for `cooldown` before talking to providers again.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::Instant;

use crate::models::CurrencyPair;

/// Default number of requests per pair allowed inside the window.
pub const DEFAULT_MAX_REQUESTS: usize = 10;

/// Default sliding window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default cooldown applied once the limit is exceeded.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);

/// Throttle configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ThrottleConfig {
    pub max_requests: usize,
    pub window: Duration,
    pub cooldown: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Request history shared by every caller of one orchestrator.
pub struct RequestThrottle {
    history: Mutex<HashMap<CurrencyPair, VecDeque<Instant>>>,
    config: ThrottleConfig,
}

impl RequestThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            history: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Lock the history mutex, recovering from poison if necessary.
    ///
    /// The worst case after a poisoned lock is a slightly wrong request
    /// count, which only affects how long a caller waits.
    fn lock_history(&self) -> MutexGuard<'_, HashMap<CurrencyPair, VecDeque<Instant>>> {
        self.history.lock().unwrap_or_else(|poisoned| {
            warn!("Request throttle mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Record one provider attempt for `pair`, successful or not.
    pub fn record(&self, pair: &CurrencyPair) {
        let now = Instant::now();
        let mut history = self.lock_history();
        let entries = history.entry(pair.clone()).or_default();
        prune(entries, now, self.config.window);
        entries.push_back(now);
    }

    /// Attempts recorded for `pair` inside the current window.
    pub fn recent_count(&self, pair: &CurrencyPair) -> usize {
        let now = Instant::now();
        let mut history = self.lock_history();
        match history.get_mut(pair) {
            Some(entries) => {
                prune(entries, now, self.config.window);
                entries.len()
            }
            None => 0,
        }
    }

    /// Sleep for the cooldown if `pair` is over its limit. Returns whether
    /// the caller was throttled.
    pub async fn wait_if_needed(&self, pair: &CurrencyPair) -> bool {
        let count = self.recent_count(pair);
        if count <= self.config.max_requests {
            return false;
        }

        info!(
            "Throttling {}: {} requests in {:?}, cooling down for {:?}",
            pair, count, self.config.window, self.config.cooldown
        );
        tokio::time::sleep(self.config.cooldown).await;
        true
    }

    /// Forget the history for `pair`.
    pub fn reset(&self, pair: &CurrencyPair) {
        if self.lock_history().remove(pair).is_some() {
            debug!("Request history reset for {}", pair);
        }
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(ThrottleConfig::default())
    }
}

fn prune(entries: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = entries.front() {
        if now.duration_since(*oldest) >= window {
            entries.pop_front();
        } else {
            break;
        }
    }
}
