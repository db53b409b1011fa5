use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Map of memoized values with a fixed time-to-live.
///
/// Expiry is checked on read, and every insert sweeps out entries that have
/// already expired. Nothing is evicted in the background.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (V, Instant)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Fresh value for `key` as of `now`. Expired entries are dropped.
    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let (value, expires) = self.entries.get(key)?;
        if now < *expires {
            return Some(value.clone());
        }
        self.entries.remove(key);
        None
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn insert_at(&mut self, key: K, value: V, now: Instant) {
        self.entries.retain(|_, (_, expires)| now < *expires);
        self.entries.insert(key, (value, now + self.ttl));
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_served_until_expiry() {
        let t0 = Instant::now();
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert_at("k", 7, t0);
        assert_eq!(cache.get_at(&"k", t0 + Duration::from_secs(59)), Some(7));
        assert_eq!(cache.get_at(&"k", t0 + Duration::from_secs(60)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_refreshes_expiry() {
        let t0 = Instant::now();
        let mut cache = TtlCache::new(Duration::from_secs(10));
        cache.insert_at("k", 1, t0);
        cache.insert_at("k", 2, t0 + Duration::from_secs(8));
        assert_eq!(cache.get_at(&"k", t0 + Duration::from_secs(15)), Some(2));
    }

    #[test]
    fn test_insert_sweeps_expired_entries() {
        let t0 = Instant::now();
        let mut cache = TtlCache::new(Duration::from_secs(10));
        cache.insert_at("stale-1", 1, t0);
        cache.insert_at("stale-2", 2, t0 + Duration::from_secs(1));
        cache.insert_at("fresh", 3, t0 + Duration::from_secs(5));
        assert_eq!(cache.len(), 3);

        cache.insert_at("new", 4, t0 + Duration::from_secs(11));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at(&"stale-2", t0 + Duration::from_secs(11)), None);
        assert_eq!(cache.get_at(&"fresh", t0 + Duration::from_secs(11)), Some(3));
        assert_eq!(cache.get_at(&"new", t0 + Duration::from_secs(11)), Some(4));
    }

    #[test]
    fn test_zero_ttl_never_serves() {
        let mut cache = TtlCache::new(Duration::ZERO);
        cache.insert("k", 1);
        assert_eq!(cache.get(&"k"), None);
    }
}
