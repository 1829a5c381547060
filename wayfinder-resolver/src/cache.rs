//! Bounded, TTL-aware result cache.
//!
//! Reads take a shared lock and record recency with an atomic tick, so hot
//! keys do not serialise on a writer lock. Expiry is checked on read; an
//! expired entry is dropped and reported as a miss. Inserting into a full
//! cache first purges expired entries and then evicts the least recently
//! used one.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

/// Default number of entries retained per cache.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Default time-to-live for cached results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Sizing and expiry settings for a [`ResultCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of live entries. Zero disables caching.
    pub max_entries: usize,
    /// Lifetime applied by [`ResultCache::insert`].
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    /// Disabled cache: every lookup misses and nothing is stored.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            max_entries: 0,
            ttl: DEFAULT_TTL,
        }
    }

    /// Set the entry limit.
    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set the default time-to-live.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing or an expired entry.
    pub misses: u64,
    /// Live entries dropped to make room for new ones.
    pub evictions: u64,
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    /// `None` when the TTL overflows the clock and the entry never expires.
    expires_at: Option<Instant>,
    last_used: AtomicU64,
}

impl<V> Slot<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Concurrent key/value cache with per-entry expiry and LRU eviction.
///
/// # Examples
///
/// ```
/// use wayfinder_resolver::{CacheConfig, ResultCache};
///
/// let cache = ResultCache::new(CacheConfig::default().with_max_entries(2));
/// cache.insert("mumbai|india".to_owned(), (19.076, 72.877));
/// assert_eq!(cache.get(&"mumbai|india".to_owned()), Some((19.076, 72.877)));
/// assert_eq!(cache.get(&"pune|india".to_owned()), None);
/// assert_eq!(cache.stats().hits, 1);
/// ```
#[derive(Debug)]
pub struct ResultCache<K, V> {
    config: CacheConfig,
    entries: RwLock<HashMap<K, Slot<V>>>,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Settings the cache was built with.
    #[must_use]
    pub const fn config(&self) -> CacheConfig {
        self.config
    }

    /// Whether the cache stores anything at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.max_entries > 0
    }

    /// Look up a live entry, refreshing its recency.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(slot) if !slot.is_expired(now) => {
                    slot.last_used.store(self.tick(), Ordering::Relaxed);
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(slot.value.clone());
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|slot| slot.is_expired(now)) {
            entries.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    pub fn put(&self, key: K, value: V, ttl: Duration) {
        if !self.is_enabled() {
            return;
        }
        let now = Instant::now();
        let slot = Slot {
            value,
            expires_at: now.checked_add(ttl),
            last_used: AtomicU64::new(self.tick()),
        };

        let mut entries = self.entries.write();
        if !entries.contains_key(&key) && entries.len() >= self.config.max_entries {
            entries.retain(|_, existing| !existing.is_expired(now));
            while entries.len() >= self.config.max_entries {
                let Some(victim) = least_recently_used(&entries) else {
                    break;
                };
                entries.remove(&victim);
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        entries.insert(key, slot);
    }

    /// Store `value` under `key` using the configured TTL.
    pub fn insert(&self, key: K, value: V) {
        self.put(key, value, self.config.ttl);
    }

    /// Remove an entry, returning its value if it was still live.
    pub fn remove(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        self.entries
            .write()
            .remove(key)
            .filter(|slot| !slot.is_expired(now))
            .map(|slot| slot.value)
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, slot| !slot.is_expired(now));
        before.saturating_sub(entries.len())
    }

    /// Remove all entries. Counters are kept.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of the hit, miss and eviction counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }
}

fn least_recently_used<K: Clone, V>(entries: &HashMap<K, Slot<V>>) -> Option<K> {
    entries
        .iter()
        .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
        .map(|(key, _)| key.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn cache() -> ResultCache<String, u32> {
        ResultCache::new(CacheConfig::default().with_max_entries(2))
    }

    fn key(name: &str) -> String {
        name.to_owned()
    }

    #[rstest]
    fn counts_hits_and_misses(cache: ResultCache<String, u32>) {
        cache.insert(key("a"), 1);

        assert_eq!(cache.get(&key("a")), Some(1));
        assert_eq!(cache.get(&key("b")), None);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                evictions: 0
            }
        );
    }

    #[rstest]
    fn evicts_least_recently_read_entry(cache: ResultCache<String, u32>) {
        cache.insert(key("a"), 1);
        cache.insert(key("b"), 2);
        assert_eq!(cache.get(&key("a")), Some(1));

        cache.insert(key("c"), 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key("b")), None);
        assert_eq!(cache.get(&key("a")), Some(1));
        assert_eq!(cache.get(&key("c")), Some(3));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[rstest]
    fn replacing_a_key_does_not_evict(cache: ResultCache<String, u32>) {
        cache.insert(key("a"), 1);
        cache.insert(key("b"), 2);
        cache.insert(key("a"), 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key("a")), Some(10));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[rstest]
    fn zero_capacity_disables_caching() {
        let cache = ResultCache::new(CacheConfig::disabled());
        cache.insert(key("a"), 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&key("a")), None);
    }

    #[rstest]
    fn remove_and_clear(cache: ResultCache<String, u32>) {
        cache.insert(key("a"), 1);
        cache.insert(key("b"), 2);

        assert_eq!(cache.remove(&key("a")), Some(1));
        assert_eq!(cache.remove(&key("a")), None);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_misses() {
        let cache = ResultCache::new(CacheConfig::default().with_ttl(Duration::from_secs(60)));
        cache.insert(key("a"), 1);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(&key("a")), Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&key("a")), None);
        assert!(cache.is_empty(), "expired entry should be dropped on read");
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn full_cache_prefers_purging_expired_entries() {
        let cache = ResultCache::new(CacheConfig::default().with_max_entries(2));
        cache.put(key("short"), 1, Duration::from_secs(1));
        cache.put(key("long"), 2, Duration::from_secs(600));

        tokio::time::advance(Duration::from_secs(5)).await;
        cache.insert(key("new"), 3);

        assert_eq!(cache.get(&key("long")), Some(2));
        assert_eq!(cache.get(&key("new")), Some(3));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn purge_expired_reports_removed_count() {
        let cache = ResultCache::new(CacheConfig::default());
        cache.put(key("a"), 1, Duration::from_secs(1));
        cache.put(key("b"), 2, Duration::from_secs(1));
        cache.put(key("c"), 3, Duration::from_secs(100));

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u8, u32),
        Get(u8),
        Remove(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0_u8..16, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            (0_u8..16).prop_map(Op::Get),
            (0_u8..16).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(capacity in 0_usize..6, ops in prop::collection::vec(op(), 0..64)) {
            let cache = ResultCache::new(CacheConfig::default().with_max_entries(capacity));
            for step in ops {
                match step {
                    Op::Insert(k, v) => {
                        cache.insert(k, v);
                        if capacity > 0 {
                            prop_assert_eq!(cache.get(&k), Some(v));
                        }
                    }
                    Op::Get(k) => {
                        cache.get(&k);
                    }
                    Op::Remove(k) => {
                        cache.remove(&k);
                    }
                }
                prop_assert!(cache.len() <= capacity);
            }
        }
    }
}
