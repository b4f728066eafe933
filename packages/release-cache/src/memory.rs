use crate::PageCache;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

struct Entries<V> {
    data: HashMap<String, V>,
    // insertion order, oldest first
    order: VecDeque<String>,
}

/// In-memory cache that lives as long as its owner.
///
/// Unbounded by default; [`MemoryPageCache::bounded`] evicts the oldest
/// inserted keys once `capacity` is exceeded.
pub struct MemoryPageCache<V> {
    entries: RwLock<Entries<V>>,
    capacity: Option<usize>,
}

impl<V> Default for MemoryPageCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoryPageCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries {
                data: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: None,
        }
    }

    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.data.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl<V> PageCache<V> for MemoryPageCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries.data.get(key).cloned()
    }

    async fn set(&self, key: &str, value: V) {
        if self.capacity == Some(0) {
            return;
        }
        let mut entries = self.entries.write().await;
        if entries.data.insert(key.to_string(), value).is_none() {
            entries.order.push_back(key.to_string());
        }
        if let Some(capacity) = self.capacity {
            while entries.data.len() > capacity {
                match entries.order.pop_front() {
                    Some(oldest) => {
                        entries.data.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
    }

    async fn remove(&self, key: &str) {
        let mut entries = self.entries.write().await;
        if entries.data.remove(key).is_some() {
            entries.order.retain(|k| k != key);
        }
    }

    async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.data.clear();
        entries.order.clear();
    }
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

#[async_trait]
impl<V> PageCache<V> for NoCache
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, _key: &str) -> Option<V> {
        None
    }

    async fn set(&self, _key: &str, _value: V) {}

    async fn remove(&self, _key: &str) {}

    async fn clear(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unbounded_keeps_everything() {
        let cache = MemoryPageCache::new();
        for i in 0..100 {
            cache.set(&i.to_string(), i).await;
        }
        assert_eq!(cache.len().await, 100);
        assert_eq!(cache.get("42").await, Some(42));
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_bounded_evicts_oldest() {
        let cache = MemoryPageCache::bounded(2);
        cache.set("", vec!["newest"]).await;
        cache.set("v1.0.0", vec!["older"]).await;
        // overwriting does not change insertion order
        cache.set("", vec!["newest", "again"]).await;
        cache.set("v0.9.0", vec!["oldest"]).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("").await, None);
        assert_eq!(cache.get("v1.0.0").await, Some(vec!["older"]));
        assert_eq!(cache.get("v0.9.0").await, Some(vec!["oldest"]));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = MemoryPageCache::new();
        cache.set("a", 1).await;
        cache.set("b", 2).await;
        cache.remove("a").await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some(2));
        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_no_cache() {
        let cache = NoCache;
        PageCache::<u32>::set(&cache, "a", 1).await;
        assert_eq!(PageCache::<u32>::get(&cache, "a").await, None);
    }

    #[tokio::test]
    async fn test_zero_capacity_stores_nothing() {
        let cache = MemoryPageCache::bounded(0);
        cache.set("a", 1).await;
        assert!(cache.is_empty().await);
    }
}
