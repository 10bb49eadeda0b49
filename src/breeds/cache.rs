// Time-bounded breed cache with an injectable clock

use chrono::{DateTime, Duration, Utc};
use moka::future::Cache;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

const BREEDS_KEY: &str = "breeds";

/// Source of "now" for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
struct CachedBreeds {
    names: Arc<HashSet<String>>,
    expires_at: DateTime<Utc>,
}

/// Holds the normalised breed list until its TTL runs out on the injected clock
pub struct BreedCache {
    entries: Cache<&'static str, CachedBreeds>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl BreedCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Cache::builder().max_capacity(1).build(),
            ttl,
            clock,
        }
    }

    /// The cached list, unless it has expired
    pub async fn fresh(&self) -> Option<Arc<HashSet<String>>> {
        let cached = self.entries.get(BREEDS_KEY).await?;
        if self.clock.now() < cached.expires_at {
            Some(cached.names)
        } else {
            self.entries.invalidate(BREEDS_KEY).await;
            None
        }
    }

    pub async fn store(&self, names: HashSet<String>) -> Arc<HashSet<String>> {
        let names = Arc::new(names);
        let entry = CachedBreeds {
            names: names.clone(),
            expires_at: self.clock.now() + self.ttl,
        };
        self.entries.insert(BREEDS_KEY, entry).await;
        names
    }

    pub async fn invalidate(&self) {
        self.entries.invalidate(BREEDS_KEY).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_entry_expires_on_clock() {
        let clock = Arc::new(ManualClock::default());
        let cache = BreedCache::new(Duration::hours(24), clock.clone());

        assert!(cache.fresh().await.is_none());
        cache.store(names(&["bengal"])).await;
        assert!(cache.fresh().await.is_some());

        clock.advance(Duration::hours(23));
        assert!(cache.fresh().await.is_some());

        clock.advance(Duration::hours(1));
        assert!(cache.fresh().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_drops_entry() {
        let cache = BreedCache::new(Duration::hours(1), Arc::new(SystemClock));
        cache.store(names(&["siamese"])).await;
        cache.invalidate().await;
        assert!(cache.fresh().await.is_none());
    }
}
