//! Weighted, time-limited cache for resolved logins.
//!
//! # Responsibilities
//! - Store one entry per key with its insertion time and byte weight
//! - Treat entries older than the TTL as absent
//! - Keep the total weight under the configured maximum
//!
//! # Design Decisions
//! - Sharded map (DashMap): readers of different keys do not block each other
//! - Entries are replaced wholesale, never edited; only the access stamp moves
//! - Eviction is approximate LRU: oldest access stamps go first, down to a
//!   low watermark so that a full cache does not sweep on every insert
//! - Weight is an estimate (`key.len() + ENTRY_OVERHEAD`), not real memory use

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use dashmap::DashMap;
use tokio::time::{Duration, Instant};

/// Fixed per-entry weight added to the key length (the identifier itself).
pub const ENTRY_OVERHEAD: usize = 8;

/// An eviction sweep shrinks the total weight to `max_weight - max_weight / EVICTION_FRACTION`.
const EVICTION_FRACTION: usize = 10;

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    weight: usize,
    /// Access clock value of the last read or write.
    last_access: AtomicU64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) >= ttl
    }
}

/// A bounded concurrent map with TTL expiry.
#[derive(Debug)]
pub struct WeightedTtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    weight: AtomicUsize,
    max_weight: usize,
    ttl: Duration,
    access_clock: AtomicU64,
    evicting: AtomicBool,
}

impl<V: Clone> WeightedTtlCache<V> {
    pub fn new(max_weight: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            weight: AtomicUsize::new(0),
            max_weight,
            ttl,
            access_clock: AtomicU64::new(0),
            evicting: AtomicBool::new(false),
        }
    }

    /// Weight an entry for `key` contributes.
    pub fn weigh(key: &str) -> usize {
        key.len() + ENTRY_OVERHEAD
    }

    /// Look up a fresh entry. Expired entries are removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now, self.ttl) => {
                entry.last_access.store(self.tick(), Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.remove_expired(key, now);
        }
        None
    }

    /// Insert or replace the entry for `key`, evicting if over capacity.
    pub fn insert(&self, key: String, value: V) {
        let now = Instant::now();
        let weight = Self::weigh(&key);
        let entry = CacheEntry {
            value,
            inserted_at: now,
            weight,
            last_access: AtomicU64::new(self.tick()),
        };

        self.weight.fetch_add(weight, Ordering::SeqCst);
        if let Some(previous) = self.entries.insert(key, entry) {
            self.weight.fetch_sub(previous.weight, Ordering::Relaxed);
        }

        if self.weight.load(Ordering::SeqCst) > self.max_weight {
            self.evict(now);
        }
    }

    /// Approximate number of entries (may include not-yet-swept expired ones).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current total weight in bytes.
    pub fn weight(&self) -> usize {
        self.weight.load(Ordering::Relaxed)
    }

    pub fn max_weight(&self) -> usize {
        self.max_weight
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn tick(&self) -> u64 {
        self.access_clock.fetch_add(1, Ordering::Relaxed)
    }

    fn remove_expired(&self, key: &str, now: Instant) {
        let ttl = self.ttl;
        if let Some((_, entry)) = self.entries.remove_if(key, |_, entry| entry.is_expired(now, ttl)) {
            self.weight.fetch_sub(entry.weight, Ordering::Relaxed);
        }
    }

    /// Drop expired entries, then least recently used ones until under the low watermark.
    ///
    /// One sweep runs at a time and concurrent inserters skip. The sweeper
    /// re-checks the weight after releasing the flag, so an insert that was
    /// skipped during the sweep is still brought under the bound.
    fn evict(&self, now: Instant) {
        loop {
            if self
                .evicting
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return;
            }

            self.sweep(now);
            self.evicting.store(false, Ordering::SeqCst);

            if self.weight.load(Ordering::SeqCst) <= self.max_weight {
                return;
            }
        }
    }

    fn sweep(&self, now: Instant) {
        let ttl = self.ttl;
        let mut expired = 0usize;
        self.entries.retain(|_, entry| {
            if entry.is_expired(now, ttl) {
                self.weight.fetch_sub(entry.weight, Ordering::Relaxed);
                expired += 1;
                false
            } else {
                true
            }
        });

        let target = self.max_weight - self.max_weight / EVICTION_FRACTION;
        let mut evicted = 0usize;
        if self.weight.load(Ordering::Relaxed) > self.max_weight {
            let mut candidates: Vec<(u64, String)> = self
                .entries
                .iter()
                .map(|entry| (entry.last_access.load(Ordering::Relaxed), entry.key().clone()))
                .collect();
            candidates.sort_unstable_by_key(|(stamp, _)| *stamp);

            for (_, key) in candidates {
                if self.weight.load(Ordering::Relaxed) <= target {
                    break;
                }
                if let Some((_, entry)) = self.entries.remove(&key) {
                    self.weight.fetch_sub(entry.weight, Ordering::Relaxed);
                    evicted += 1;
                }
            }
        }

        tracing::debug!(
            expired,
            evicted,
            entries = self.entries.len(),
            weight = self.weight.load(Ordering::Relaxed),
            "Cache eviction sweep"
        );
    }
}
