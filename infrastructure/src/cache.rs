//! In-memory synthesis cache.
//!
//! The only resource shared across concurrent runs. Writes are keyed by
//! fingerprint and idempotent: a second write with the same fingerprint
//! keeps the first entry, so a verdict is paid for at most once.

use async_trait::async_trait;
use panel_application::ports::cache::SynthesisCache;
use panel_domain::CacheEntry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// Hit/miss/store counters for one cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// Fingerprint-keyed in-memory cache.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl SynthesisCache for MemoryCache {
    async fn lookup(&self, fingerprint: &str) -> Option<CacheEntry> {
        let entry = self.entries.read().await.get(fingerprint).cloned();
        match &entry {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(fingerprint, "synthesis cache hit");
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        entry
    }

    async fn store(&self, entry: CacheEntry) {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&entry.fingerprint) {
            return;
        }
        self.stores.fetch_add(1, Ordering::Relaxed);
        entries.insert(entry.fingerprint.clone(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(fingerprint: &str, verdict: &str) -> CacheEntry {
        CacheEntry::new(fingerprint.to_string(), verdict.to_string(), None, 0.05, "gpt-4o")
    }

    #[tokio::test]
    async fn lookup_after_store_returns_entry() {
        let cache = MemoryCache::new();
        cache.store(entry("fp1", "verdict")).await;

        let found = cache.lookup("fp1").await.unwrap();
        assert_eq!(found.verdict_text, "verdict");
        assert!(cache.lookup("fp2").await.is_none());
    }

    #[tokio::test]
    async fn second_store_with_same_fingerprint_is_a_no_op() {
        let cache = MemoryCache::new();
        cache.store(entry("fp1", "first")).await;
        cache.store(entry("fp1", "second")).await;

        let found = cache.lookup("fp1").await.unwrap();
        assert_eq!(found.verdict_text, "first");
        assert_eq!(cache.stats().stores, 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn stats_track_hits_and_misses() {
        let cache = MemoryCache::new();
        cache.store(entry("fp1", "verdict")).await;

        cache.lookup("fp1").await;
        cache.lookup("fp1").await;
        cache.lookup("absent").await;

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn clear_empties_the_cache() {
        let cache = MemoryCache::new();
        cache.store(entry("fp1", "verdict")).await;
        assert!(!cache.is_empty().await);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
