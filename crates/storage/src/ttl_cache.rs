//! Time-bounded in-process cache.

use glow_primitives::Clock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Map whose entries expire `ttl` after insertion, measured by an injected clock.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, (u64, V)>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`, if any.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now_unix();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|(expires_at, _)| now < *expires_at)
            .map(|(_, value)| value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        let now = self.clock.now_unix();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (expires_at, _)| *expires_at > now);
        entries.insert(key, (now.saturating_add(self.ttl.as_secs()), value));
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.write().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Entries not yet expired.
    pub async fn len(&self) -> usize {
        let now = self.clock.now_unix();
        self.entries
            .read()
            .await
            .values()
            .filter(|(expires_at, _)| now < *expires_at)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glow_primitives::ManualClock;

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache: TtlCache<&'static str, u32> = TtlCache::new(Duration::from_secs(30), clock.clone());

        cache.insert("regions", 7).await;
        assert_eq!(cache.get(&"regions").await, Some(7));

        clock.advance(29);
        assert_eq!(cache.get(&"regions").await, Some(7));

        clock.advance(1);
        assert_eq!(cache.get(&"regions").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_insert_prunes_expired_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let cache: TtlCache<u32, u32> = TtlCache::new(Duration::from_secs(10), clock.clone());
        cache.insert(1, 1).await;
        clock.advance(20);
        cache.insert(2, 2).await;
        assert_eq!(cache.entries.read().await.len(), 1);

        cache.invalidate(&2).await;
        assert_eq!(cache.get(&2).await, None);
    }
}
