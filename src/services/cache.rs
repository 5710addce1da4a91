// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! In-memory search response cache with TTL expiry and a bounded entry count.

use crate::models::search::RawApiResponse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Time source for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Reads the tokio clock (which follows `tokio::time::pause` in tests)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exact `(query, limit, offset)` lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: String,
    pub limit: u32,
    pub offset: u32,
}

impl CacheKey {
    pub fn new(query: &str, limit: u32, offset: u32) -> Self {
        Self {
            query: query.to_string(),
            limit,
            offset,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedResponse {
    payload: RawApiResponse,
    stored_at: Instant,
    /// Write order, used for oldest-first eviction
    seq: u64,
}

#[derive(Default)]
struct Entries {
    map: HashMap<CacheKey, CachedResponse>,
    next_seq: u64,
}

/// Shared search response cache.
///
/// Entries are replaced wholesale on every write and are only valid while
/// `now - stored_at < ttl`.
pub struct ResponseCache {
    entries: Mutex<Entries>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self::with_clock(ttl, max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            ttl,
            max_entries: max_entries.max(1),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached payload if present and not expired
    pub fn get(&self, query: &str, limit: u32, offset: u32) -> Option<RawApiResponse> {
        let key = CacheKey::new(query, limit, offset);
        let now = self.clock.now();
        let mut entries = self.lock();

        let fresh = match entries.map.get(&key) {
            Some(entry) => now.duration_since(entry.stored_at) < self.ttl,
            None => return None,
        };

        if !fresh {
            entries.map.remove(&key);
            return None;
        }

        entries.map.get(&key).map(|entry| entry.payload.clone())
    }

    /// Store a payload, overwriting any existing entry for the key
    pub fn set(&self, query: &str, limit: u32, offset: u32, payload: RawApiResponse) {
        let key = CacheKey::new(query, limit, offset);
        let now = self.clock.now();
        let ttl = self.ttl;
        let mut entries = self.lock();

        if !entries.map.contains_key(&key) && entries.map.len() >= self.max_entries {
            entries
                .map
                .retain(|_, entry| now.duration_since(entry.stored_at) < ttl);

            while entries.map.len() >= self.max_entries {
                let oldest = entries
                    .map
                    .iter()
                    .min_by_key(|(_, entry)| entry.seq)
                    .map(|(key, _)| key.clone());
                match oldest {
                    Some(oldest) => {
                        entries.map.remove(&oldest);
                    }
                    None => break,
                }
            }
        }

        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.map.insert(
            key,
            CachedResponse {
                payload,
                stored_at: now,
                seq,
            },
        );
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.lock().map.clear();
    }

    /// Number of stored entries, expired ones included until they are touched
    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::search::RawAnswer;

    fn payload(text: &str) -> RawApiResponse {
        RawApiResponse {
            answer: Some(RawAnswer {
                text: text.to_string(),
                citations: vec![],
            }),
            ..Default::default()
        }
    }

    fn cache_with_clock(ttl_secs: u64, max_entries: usize) -> (ResponseCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache =
            ResponseCache::with_clock(Duration::from_secs(ttl_secs), max_entries, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (cache, _) = cache_with_clock(600, 10);
        assert!(cache.get("AI agents", 10, 0).is_none());
    }

    #[test]
    fn test_set_then_get() {
        let (cache, _) = cache_with_clock(600, 10);
        cache.set("AI agents", 10, 0, payload("agents"));
        assert_eq!(cache.get("AI agents", 10, 0), Some(payload("agents")));
    }

    #[test]
    fn test_key_is_exact_triple() {
        let (cache, _) = cache_with_clock(600, 10);
        cache.set("AI agents", 10, 0, payload("agents"));

        assert!(cache.get("AI agents", 20, 0).is_none());
        assert!(cache.get("AI agents", 10, 10).is_none());
        assert!(cache.get("ai agents", 10, 0).is_none());
        assert!(cache.get("AI agent", 10, 0).is_none());
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (cache, clock) = cache_with_clock(600, 10);
        cache.set("AI agents", 10, 0, payload("agents"));

        clock.advance(Duration::from_secs(599));
        assert!(cache.get("AI agents", 10, 0).is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get("AI agents", 10, 0).is_none());
        // Expired entries are dropped on access
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_overwrites_and_refreshes() {
        let (cache, clock) = cache_with_clock(600, 10);
        cache.set("AI agents", 10, 0, payload("old"));
        clock.advance(Duration::from_secs(500));
        cache.set("AI agents", 10, 0, payload("new"));
        clock.advance(Duration::from_secs(500));

        assert_eq!(cache.get("AI agents", 10, 0), Some(payload("new")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let (cache, _) = cache_with_clock(600, 2);
        cache.set("first query", 10, 0, payload("1"));
        cache.set("second query", 10, 0, payload("2"));
        cache.set("third query", 10, 0, payload("3"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("first query", 10, 0).is_none());
        assert!(cache.get("second query", 10, 0).is_some());
        assert!(cache.get("third query", 10, 0).is_some());
    }

    #[test]
    fn test_rewrite_moves_entry_to_newest() {
        let (cache, _) = cache_with_clock(600, 2);
        cache.set("first query", 10, 0, payload("1"));
        cache.set("second query", 10, 0, payload("2"));
        cache.set("first query", 10, 0, payload("1b"));
        cache.set("third query", 10, 0, payload("3"));

        assert!(cache.get("second query", 10, 0).is_none());
        assert_eq!(cache.get("first query", 10, 0), Some(payload("1b")));
    }

    #[test]
    fn test_expired_entries_make_room_before_eviction() {
        let (cache, clock) = cache_with_clock(60, 2);
        cache.set("first query", 10, 0, payload("1"));
        clock.advance(Duration::from_secs(30));
        cache.set("second query", 10, 0, payload("2"));
        clock.advance(Duration::from_secs(31));

        // "first query" has expired, so "second query" survives
        cache.set("third query", 10, 0, payload("3"));
        assert!(cache.get("second query", 10, 0).is_some());
        assert!(cache.get("third query", 10, 0).is_some());
    }

    #[test]
    fn test_clear() {
        let (cache, _) = cache_with_clock(600, 10);
        cache.set("AI agents", 10, 0, payload("agents"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
