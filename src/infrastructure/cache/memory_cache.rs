//! In-process cache with per-entry expiry.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry {
    long_url: String,
    /// `None` when the TTL runs past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Cache kept in process memory.
///
/// Backs the single-process mode and tests. [`MemoryCache::set_failing`]
/// makes every operation return an error, to exercise degraded paths.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    failing: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent operations fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> CacheResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionError(
                "memory cache marked as failing".to_string(),
            ));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // A poisoned map is still structurally valid.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        self.check()?;
        let mut entries = self.lock();

        match entries.get(short_code) {
            Some(entry) if entry.is_live(Instant::now()) => Ok(Some(entry.long_url.clone())),
            Some(_) => {
                entries.remove(short_code);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_url(&self, short_code: &str, long_url: &str, ttl: Duration) -> CacheResult<()> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.lock();

        // Expired entries are otherwise only dropped when read.
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            short_code.to_string(),
            Entry {
                long_url: long_url.to_string(),
                expires_at: now.checked_add(ttl),
            },
        );
        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        self.check()?;
        self.lock().remove(short_code);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCache::new();
        cache
            .set_url("1", "https://example.com", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get_url("1").await.unwrap(),
            Some("https://example.com".to_string())
        );
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache
            .set_url("1", "https://example.com", Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(cache.get_url("1").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_set_prunes_expired_entries() {
        let cache = MemoryCache::new();
        for code in ["1", "2", "3"] {
            cache
                .set_url(code, "https://example.com", Duration::ZERO)
                .await
                .unwrap();
        }

        cache
            .set_url("4", "https://example.com", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.lock().len(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_overflow() {
        let cache = MemoryCache::new();
        cache
            .set_url("1", "https://example.com", Duration::MAX)
            .await
            .unwrap();

        assert_eq!(
            cache.get_url("1").await.unwrap(),
            Some("https://example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.set_url("1", "https://a.com", ttl).await.unwrap();
        cache.set_url("1", "https://b.com", ttl).await.unwrap();

        assert_eq!(
            cache.get_url("1").await.unwrap(),
            Some("https://b.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = MemoryCache::new();
        cache
            .set_url("1", "https://a.com", Duration::from_secs(60))
            .await
            .unwrap();
        cache.invalidate("1").await.unwrap();

        assert_eq!(cache.get_url("1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failing_cache_reports_errors() {
        let cache = MemoryCache::new();
        cache.set_failing(true);

        assert!(cache.get_url("1").await.is_err());
        assert!(
            cache
                .set_url("1", "https://a.com", Duration::from_secs(1))
                .await
                .is_err()
        );
        assert!(!cache.health_check().await);

        cache.set_failing(false);
        assert!(cache.health_check().await);
    }
}
