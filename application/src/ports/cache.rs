//! Synthesis cache port
//!
//! Content-addressed store for computed verdicts, keyed by fingerprint.
//! A hit skips the synthesizer call entirely, so correctness (no false
//! hits) matters more than hit rate. Implementations live in the
//! infrastructure layer.

use async_trait::async_trait;
use panel_domain::CacheEntry;

/// Content-addressed verdict store.
#[async_trait]
pub trait SynthesisCache: Send + Sync {
    /// Look up a previously computed verdict. Lookups are atomic per
    /// fingerprint; a half-written entry is never visible.
    async fn lookup(&self, fingerprint: &str) -> Option<CacheEntry>;

    /// Store a computed verdict. Idempotent: a second store with the same
    /// fingerprint is a no-op.
    async fn store(&self, entry: CacheEntry);
}

/// Cache that never hits and never stores, for callers that disable caching.
pub struct NullCache;

#[async_trait]
impl SynthesisCache for NullCache {
    async fn lookup(&self, _fingerprint: &str) -> Option<CacheEntry> {
        None
    }

    async fn store(&self, _entry: CacheEntry) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_cache_never_hits() {
        let cache = NullCache;
        cache
            .store(CacheEntry::new("fp", "verdict", None, 0.01, "synth"))
            .await;
        assert!(cache.lookup("fp").await.is_none());
    }
}
