// Query Result Cache Service
//
// Implements an LRU cache of answered questions with TTL support.
// Entries are keyed by the normalized question and the schema fingerprint,
// so a dataset with a different shape never sees stale rows.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::QueryError;
use crate::models::Row;

/// Cached answer with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub rows: Vec<Row>,
    /// Query text that produced the rows
    pub generated_query: String,
    pub limit_applied: bool,
    /// Time when cached
    pub created_at: Instant,
}

#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    /// Access tick; the smallest tick is the least recently used
    last_access: u64,
    /// Number of times this cache entry was hit
    hit_count: u64,
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Total cache hits
    pub hits: u64,
    /// Total cache misses
    pub misses: u64,
    /// Total evictions
    pub evictions: u64,
    /// Total expirations
    pub expirations: u64,
}

impl CacheStats {
    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    slots: HashMap<String, Slot>,
    tick: u64,
    stats: CacheStats,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Evict least recently used entry
    fn evict_lru(&mut self) {
        let oldest = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_access)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            self.slots.remove(&key);
            self.stats.evictions += 1;
            tracing::debug!("Evicted cache entry: {}", key);
        }
    }
}

/// Question result cache with LRU eviction and TTL
///
/// Features:
/// - LRU eviction when cache is full
/// - TTL-based expiration, checked on every read
/// - Cache statistics (hit/miss ratio)
///
/// A single mutex guards the map, the access order and the statistics, so
/// every operation is one critical section.
pub struct ResultCache {
    state: Mutex<CacheState>,
    /// Maximum number of entries
    max_entries: usize,
    /// Maximum age of a servable entry
    ttl: Duration,
}

impl ResultCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_entries,
            ttl,
        }
    }

    /// Lowercase and collapse runs of whitespace
    pub fn normalize(question: &str) -> String {
        question
            .split_whitespace()
            .map(|word| word.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Generate cache key from the normalized question and schema fingerprint
    pub fn cache_key(question: &str, fingerprint: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(Self::normalize(question).as_bytes());
        hasher.update([0u8]);
        hasher.update(fingerprint.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn lock(&self) -> Result<MutexGuard<'_, CacheState>, QueryError> {
        self.state
            .lock()
            .map_err(|_| QueryError::Cache("cache lock poisoned".to_string()))
    }

    pub fn is_expired(&self, entry: &CacheEntry) -> bool {
        entry.created_at.elapsed() > self.ttl
    }

    /// Get cached answer if available and not expired
    ///
    /// An expired entry is removed and counted as a miss.
    pub fn get(&self, question: &str, fingerprint: &str) -> Result<Option<CacheEntry>, QueryError> {
        let key = Self::cache_key(question, fingerprint);
        let mut state = self.lock()?;

        let expired = match state.slots.get(&key) {
            Some(slot) => self.is_expired(&slot.entry),
            None => {
                state.stats.misses += 1;
                tracing::debug!("Cache miss for key: {}", key);
                return Ok(None);
            }
        };

        if expired {
            state.slots.remove(&key);
            state.stats.misses += 1;
            state.stats.expirations += 1;
            tracing::debug!("Cache expired for key: {}", key);
            return Ok(None);
        }

        let tick = state.next_tick();
        state.stats.hits += 1;
        let Some(slot) = state.slots.get_mut(&key) else {
            return Ok(None);
        };
        slot.last_access = tick;
        slot.hit_count += 1;

        tracing::debug!("Cache hit for key: {} (hit_count: {})", key, slot.hit_count);
        Ok(Some(slot.entry.clone()))
    }

    /// Store an answer, evicting the least recently used entry at capacity
    pub fn put(
        &self,
        question: &str,
        fingerprint: &str,
        rows: Vec<Row>,
        generated_query: String,
        limit_applied: bool,
    ) -> Result<(), QueryError> {
        if self.max_entries == 0 {
            return Ok(());
        }

        let key = Self::cache_key(question, fingerprint);
        let mut state = self.lock()?;

        if state.slots.len() >= self.max_entries && !state.slots.contains_key(&key) {
            state.evict_lru();
        }

        let tick = state.next_tick();
        state.slots.insert(
            key.clone(),
            Slot {
                entry: CacheEntry {
                    rows,
                    generated_query,
                    limit_applied,
                    created_at: Instant::now(),
                },
                last_access: tick,
                hit_count: 0,
            },
        );

        tracing::debug!("Cached result for key: {} (cache size: {})", key, state.slots.len());
        Ok(())
    }

    /// Clear all cache entries, returning how many were dropped
    pub fn invalidate_all(&self) -> Result<usize, QueryError> {
        let mut state = self.lock()?;
        let count = state.slots.len();
        state.slots.clear();
        tracing::info!("Cleared {} cache entries", count);
        Ok(count)
    }

    /// Remove expired entries
    pub fn cleanup_expired(&self) -> Result<usize, QueryError> {
        let mut state = self.lock()?;
        let before = state.slots.len();
        state.slots.retain(|_, slot| slot.entry.created_at.elapsed() <= self.ttl);
        let removed = before - state.slots.len();
        state.stats.expirations += removed as u64;

        if removed > 0 {
            tracing::info!("Cleaned up {} expired cache entries", removed);
        }
        Ok(removed)
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats, QueryError> {
        Ok(self.lock()?.stats.clone())
    }

    /// Get current cache size
    pub fn len(&self) -> Result<usize, QueryError> {
        Ok(self.lock()?.slots.len())
    }

    pub fn is_empty(&self) -> Result<bool, QueryError> {
        Ok(self.len()? == 0)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
