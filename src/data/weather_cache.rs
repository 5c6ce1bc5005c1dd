use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::config::{DF, WeatherSettings};
use crate::domain::{Location, WeatherSnapshot};
use crate::error::EngineError;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    snapshot: WeatherSnapshot,
    fetched_at: DateTime<Utc>,
}

/// TTL cache of weather snapshots keyed by quantized location.
/// Sharded map, so readers of different keys never contend. No lock is held across a fetch;
/// two concurrent misses on one key both fetch and the last write wins.
#[derive(Debug)]
pub struct WeatherCache {
    entries: DashMap<(i64, i64), CacheEntry>,
    ttl: Duration,
    fetch_timeout: Duration,
    key_decimals: u32,
}

impl WeatherCache {
    pub fn new(settings: &WeatherSettings) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: settings.ttl,
            fetch_timeout: settings.fetch_timeout,
            key_decimals: settings.key_decimals,
        }
    }

    fn key(&self, location: &Location) -> (i64, i64) {
        location.quantized(self.key_decimals)
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match (now - entry.fetched_at).to_std() {
            Ok(age) => age < self.ttl,
            // Entry from the "future" (clock moved back): still fresh
            Err(_) => true,
        }
    }

    pub async fn get_or_fetch<F, Fut>(&self, location: Location, fetch: F) -> Option<WeatherSnapshot>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<WeatherSnapshot>>,
    {
        self.get_or_fetch_at(location, Utc::now(), fetch).await
    }

    /// Same as `get_or_fetch` with an explicit clock reading.
    pub async fn get_or_fetch_at<F, Fut>(
        &self,
        location: Location,
        now: DateTime<Utc>,
        fetch: F,
    ) -> Option<WeatherSnapshot>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<WeatherSnapshot>>,
    {
        let key = self.key(&location);

        // Copy out and drop the shard guard before any await
        let cached = self.entries.get(&key).map(|e| *e.value());
        if let Some(entry) = cached {
            if self.is_fresh(&entry, now) {
                if DF.log_weather_cache {
                    log::info!("Weather cache hit for {:?}", key);
                }
                return Some(entry.snapshot);
            }
            if DF.log_weather_cache {
                log::info!("Weather cache entry for {:?} expired", key);
            }
        }

        let outcome = match tokio::time::timeout(self.fetch_timeout, fetch()).await {
            Ok(Ok(snapshot)) => Ok(snapshot),
            Ok(Err(e)) => Err(EngineError::WeatherFetchFailed(format!("{:#}", e))),
            Err(_) => Err(EngineError::WeatherFetchFailed(format!(
                "timed out after {:?}",
                self.fetch_timeout
            ))),
        };

        match outcome {
            Ok(snapshot) => {
                let snapshot = snapshot.stamped(now);
                self.entries.insert(
                    key,
                    CacheEntry {
                        snapshot,
                        fetched_at: now,
                    },
                );
                Some(snapshot)
            }
            Err(e) => {
                log::warn!("{} at {}; using neutral weather", e, location);
                None
            }
        }
    }

    /// Drops expired entries, returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| self.is_fresh(entry, now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
