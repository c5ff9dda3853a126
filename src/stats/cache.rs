//! Per-address stats cache over durable storage
//!
//! Entry = `{stats, timestamp, address}` under `userStats_<address>`. An entry
//! is valid only while younger than the cache duration and recorded for the
//! address asking. Anything else is purged and reported as a miss. Storage or
//! parse failures are logged and also count as a miss.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::model::UserStats;
use crate::core::keys::stats as keys;
use crate::error::StorageError;
use crate::storage::DurableStorage;
use crate::wallet::address;

/// Wall clock in milliseconds
pub fn now_ms() -> i64 { chrono::Utc::now().timestamp_millis() }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsCacheEntry {
    pub stats: UserStats,
    /// Milliseconds since epoch
    pub timestamp: i64,
    pub address: String,
}

impl StatsCacheEntry {
    pub fn age_ms(&self, now_ms: i64) -> i64 { now_ms - self.timestamp }

    pub fn is_valid_for(&self, address: &str, now_ms: i64, duration: Duration) -> bool {
        i128::from(self.age_ms(now_ms)) < duration.as_millis() as i128 && address::same(&self.address, address)
    }
}

#[derive(Clone)]
pub struct StatsCache {
    storage: Arc<dyn DurableStorage>,
    duration: Duration,
}

impl StatsCache {
    pub fn new(storage: Arc<dyn DurableStorage>, duration: Duration) -> Self { Self { storage, duration } }

    pub fn duration(&self) -> Duration { self.duration }

    /// Raw entry, no validity check
    pub fn peek(&self, address: &str) -> Option<StatsCacheEntry> {
        let key = keys::cache_key(address);
        let raw = match self.storage.get_item(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, error = %e, "stats cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = %key, error = %e, "corrupted stats cache entry, purging");
                self.remove(address);
                None
            }
        }
    }

    /// Valid entry for `address` at `now_ms`. Invalid entries are purged.
    pub fn load(&self, address: &str, now_ms: i64) -> Option<StatsCacheEntry> {
        let entry = self.peek(address)?;
        if entry.is_valid_for(address, now_ms, self.duration) {
            return Some(entry);
        }
        debug!(address, age_ms = entry.age_ms(now_ms), "stats cache entry invalid, purging");
        self.remove(address);
        None
    }

    pub fn save(&self, address: &str, stats: &UserStats, now_ms: i64) {
        let entry = StatsCacheEntry { stats: stats.clone(), timestamp: now_ms, address: address.to_string() };
        let result = serde_json::to_string(&entry)
            .map_err(StorageError::from)
            .and_then(|raw| self.storage.set_item(&keys::cache_key(address), &raw));
        if let Err(e) = result {
            warn!(address, error = %e, "stats cache write failed");
        }
    }

    pub fn remove(&self, address: &str) {
        if let Err(e) = self.storage.remove_item(&keys::cache_key(address)) {
            warn!(address, error = %e, "stats cache purge failed");
        }
    }

    /// Drop every expired or corrupted entry. Returns how many were actually
    /// removed; entries storage fails to read or delete are kept and not counted.
    pub fn purge_expired(&self, now_ms: i64) -> usize {
        let stored = match self.storage.keys() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "listing stats cache failed");
                return 0;
            }
        };
        let mut removed = 0;
        for key in stored.iter().filter(|k| keys::is_cache_key(k)) {
            let address = &key[keys::CACHE_PREFIX.len() + 1..];
            let raw = match self.storage.get_item(key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    warn!(key = %key, error = %e, "stats cache read failed, keeping entry");
                    continue;
                }
            };
            let stale = match serde_json::from_str::<StatsCacheEntry>(&raw) {
                Ok(entry) => !entry.is_valid_for(address, now_ms, self.duration),
                Err(_) => true,
            };
            if !stale {
                continue;
            }
            match self.storage.remove_item(key) {
                Ok(()) => removed += 1,
                Err(e) => warn!(key = %key, error = %e, "stats cache purge failed"),
            }
        }
        removed
    }
}
