//! Cache Store Module
//!
//! Main cache engine combining the recency list with the key index.

use tracing::{debug, trace, warn};

use crate::cache::{CacheEntry, CacheStats, HashIndex, KeyIndex, RecencyList, DEFAULT_INDEX_HINT};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == LRU Cache ==
/// Fixed-capacity cache of keyed payloads with least-recently-used eviction.
///
/// Every key in the index names exactly one entry in the recency list and
/// vice versa. After each `put` the cache holds at most `capacity()` entries.
///
/// Putting a key that is already present replaces it: the old entry is
/// unlinked and dropped, and the new one becomes the most recently used.
///
/// The engine is single-threaded. Hosts sharing one instance across threads
/// must serialize access themselves, e.g. behind a `Mutex`.
#[derive(Debug)]
pub struct LruCache<I: KeyIndex = HashIndex> {
    /// Entries ordered most to least recently used
    list: RecencyList,
    /// Key to list handle lookup
    index: I,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Number of entries currently held
    cur_size: usize,
    max_key_length: usize,
    max_content_length: usize,
}

impl LruCache<HashIndex> {
    // == Constructor ==
    /// Creates an empty cache holding at most `max_size` entries.
    ///
    /// `index_hint` sizes the key index; 0 selects the index default.
    /// A `max_size` of 0 is allowed and evicts every entry as soon as it is put.
    pub fn new(max_size: usize, index_hint: usize) -> Self {
        let config = CacheConfig {
            max_entries: max_size,
            index_hint,
            ..CacheConfig::default()
        };
        Self::from_config(&config)
    }

    /// Creates an empty cache from a [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_index(config, HashIndex::with_hint(config.index_hint))
    }
}

impl<I: KeyIndex> LruCache<I> {
    /// Creates an empty cache that uses the supplied key index.
    pub fn with_index(config: &CacheConfig, index: I) -> Self {
        let hint = match config.index_hint {
            0 => DEFAULT_INDEX_HINT,
            hint => hint,
        };
        Self {
            list: RecencyList::with_capacity(config.max_entries.min(hint)),
            index,
            stats: CacheStats::new(),
            max_size: config.max_entries,
            cur_size: 0,
            max_key_length: config.max_key_length,
            max_content_length: config.max_content_length,
        }
    }

    // == Put ==
    /// Stores a copy of `content` under `key`.
    ///
    /// See [`LruCache::put_with_length`].
    pub fn put(&mut self, key: &str, content_type: &str, content: &[u8]) -> Result<()> {
        self.put_with_length(key, content_type, content, content.len())
    }

    // == Put With Length ==
    /// Stores a copy of the first `length` bytes of `content` under `key`.
    ///
    /// The new entry becomes the most recently used. An existing entry for
    /// `key` is dropped first. Least recently used entries are then evicted
    /// until the cache is back within capacity.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty or over-long key, a `length` past the end
    /// of `content`, or a payload over the configured maximum.
    /// `AllocationFailed` if the payload buffer cannot be reserved.
    /// On error the cache is left unchanged.
    pub fn put_with_length(
        &mut self,
        key: &str,
        content_type: &str,
        content: &[u8],
        length: usize,
    ) -> Result<()> {
        self.validate(key, length)?;
        let entry = CacheEntry::with_length(key, content_type, content, length)?;

        if let Some(old) = self.index.delete(key) {
            self.list.unlink(old)?;
            self.cur_size -= 1;
            self.stats.record_replacement();
            debug!(key, "replaced existing cache entry");
        }

        let handle = self.list.insert_head(entry);
        self.index.put(key, handle);
        self.cur_size += 1;
        self.stats.record_insert();
        trace!(key, content_type, length, "cache put");

        self.evict_to_capacity()?;
        self.stats.set_total_entries(self.cur_size);
        Ok(())
    }

    // == Get ==
    /// Looks up `key` and, on a hit, promotes it to most recently used.
    ///
    /// The returned borrow ends at the next mutating call on the cache.
    pub fn get(&mut self, key: &str) -> Option<&CacheEntry> {
        let Some(handle) = self.index.get(key) else {
            self.stats.record_miss();
            trace!(key, "cache miss");
            return None;
        };

        if let Err(err) = self.list.move_to_head(handle) {
            warn!(key, %err, "key index returned a stale handle");
            self.stats.record_miss();
            return None;
        }
        self.stats.record_hit();
        trace!(key, "cache hit");
        self.list.get(handle)
    }

    // == Peek ==
    /// Looks up `key` without touching recency order or statistics.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.index.get(key).and_then(|handle| self.list.get(handle))
    }

    /// Returns true if `key` is cached. Does not affect recency.
    pub fn contains(&self, key: &str) -> bool {
        self.index.get(key).is_some()
    }

    // == Remove ==
    /// Removes `key`, handing its entry back to the caller.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let handle = self.index.delete(key)?;
        let entry = match self.list.unlink(handle) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(key, %err, "key index returned a stale handle");
                return None;
            }
        };
        self.cur_size -= 1;
        self.stats.set_total_entries(self.cur_size);
        debug!(key, "removed cache entry");
        Some(entry)
    }

    // == Clear ==
    /// Drops every entry. Statistics counters are kept.
    pub fn clear(&mut self) {
        debug!(entries = self.cur_size, "clearing cache");
        self.index.clear();
        self.list.clear();
        self.cur_size = 0;
        self.stats.set_total_entries(0);
    }

    // == Teardown ==
    /// Destroys the key index, then every entry from head to tail, then the cache.
    ///
    /// Dropping the cache releases the same resources; this makes the order explicit.
    pub fn teardown(self) {
        let Self {
            index,
            mut list,
            cur_size,
            ..
        } = self;
        debug!(entries = cur_size, "tearing down cache");
        drop(index);
        list.clear();
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.cur_size
    }

    pub fn is_empty(&self) -> bool {
        self.cur_size == 0
    }

    /// Maximum number of entries kept after a `put`.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> + '_ {
        self.list.iter()
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.list.iter().map(CacheEntry::key)
    }

    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.cur_size);
        stats
    }

    // == Consistency Check ==
    /// Verifies that the list links, the size counter and the index agree.
    pub fn check_consistency(&self) -> Result<()> {
        let linked = self.list.check_links()?;
        if linked != self.cur_size || self.index.len() != self.cur_size {
            return Err(CacheError::PreconditionFailed(format!(
                "size mismatch: list={} index={} counter={}",
                linked,
                self.index.len(),
                self.cur_size
            )));
        }
        let misindexed = self
            .keys()
            .find(|key| self.peek(key).map(CacheEntry::key) != Some(*key));
        if let Some(key) = misindexed {
            return Err(CacheError::PreconditionFailed(format!(
                "entry {key} is not indexed under its own key"
            )));
        }
        Ok(())
    }

    fn validate(&self, key: &str, length: usize) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidArgument("key must not be empty".to_string()));
        }
        if key.len() > self.max_key_length {
            return Err(CacheError::InvalidArgument(format!(
                "Key exceeds maximum length of {} bytes",
                self.max_key_length
            )));
        }
        if length > self.max_content_length {
            return Err(CacheError::InvalidArgument(format!(
                "Content exceeds maximum size of {} bytes",
                self.max_content_length
            )));
        }
        Ok(())
    }

    fn evict_to_capacity(&mut self) -> Result<()> {
        while self.cur_size > self.max_size {
            let (_, victim) = self.list.remove_tail()?;
            self.index.delete(victim.key());
            self.cur_size -= 1;
            self.stats.record_eviction();
            debug!(key = victim.key(), "evicted least recently used entry");
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Handle;
    use std::collections::BTreeMap;

    fn put(cache: &mut LruCache, key: &str) {
        cache.put(key, "text/plain", key.as_bytes()).unwrap();
    }

    fn keys(cache: &LruCache) -> Vec<&str> {
        cache.keys().collect()
    }

    #[test]
    fn test_cache_new() {
        let cache = LruCache::new(10, 0);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 10);
        cache.check_consistency().unwrap();
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = LruCache::new(10, 0);
        cache.put("k", "text/plain", b"hello world").unwrap();

        let entry = cache.get("k").unwrap();
        assert_eq!(entry.content_type(), "text/plain");
        assert_eq!(entry.content(), b"hello world");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_with_length() {
        let mut cache = LruCache::new(10, 0);
        cache.put_with_length("k", "text/plain", b"hello world", 5).unwrap();

        assert_eq!(cache.get("k").unwrap().content(), b"hello");
    }

    #[test]
    fn test_get_missing() {
        let mut cache = LruCache::new(10, 0);
        put(&mut cache, "a");

        assert!(cache.get("nope").is_none());
        assert_eq!(keys(&cache), vec!["a"]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_scenario() {
        let mut cache = LruCache::new(2, 0);

        put(&mut cache, "A");
        put(&mut cache, "B");
        put(&mut cache, "C");
        assert_eq!(keys(&cache), vec!["C", "B"]);
        assert!(cache.get("A").is_none());

        assert!(cache.get("B").is_some());
        put(&mut cache, "D");
        assert_eq!(keys(&cache), vec!["D", "B"]);
        assert!(!cache.contains("C"));
        cache.check_consistency().unwrap();
    }

    #[test]
    fn test_get_promotes() {
        let mut cache = LruCache::new(3, 0);
        put(&mut cache, "a");
        put(&mut cache, "b");
        put(&mut cache, "c");

        cache.get("a");
        assert_eq!(keys(&cache), vec!["a", "c", "b"]);

        // Second get on the head is a no-op move
        cache.get("a");
        assert_eq!(keys(&cache), vec!["a", "c", "b"]);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_peek_does_not_promote() {
        let mut cache = LruCache::new(2, 0);
        put(&mut cache, "a");
        put(&mut cache, "b");

        assert_eq!(cache.peek("a").unwrap().content(), b"a");
        put(&mut cache, "c");

        assert!(!cache.contains("a"));
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_duplicate_put_replaces() {
        let mut cache = LruCache::new(3, 0);
        put(&mut cache, "a");
        put(&mut cache, "b");
        cache.put("a", "application/json", b"{}").unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec!["a", "b"]);
        let entry = cache.get("a").unwrap();
        assert_eq!(entry.content_type(), "application/json");
        assert_eq!(entry.content(), b"{}");
        assert_eq!(cache.stats().replacements, 1);
        cache.check_consistency().unwrap();
    }

    #[test]
    fn test_duplicate_put_at_capacity_keeps_others() {
        let mut cache = LruCache::new(2, 0);
        put(&mut cache, "a");
        put(&mut cache, "b");
        put(&mut cache, "a");

        assert_eq!(keys(&cache), vec!["a", "b"]);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_zero_capacity_evicts_immediately() {
        let mut cache = LruCache::new(0, 0);
        put(&mut cache, "a");

        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
        assert_eq!(cache.stats().evictions, 1);
        cache.check_consistency().unwrap();
    }

    #[test]
    fn test_remove() {
        let mut cache = LruCache::new(3, 0);
        put(&mut cache, "a");
        put(&mut cache, "b");

        let removed = cache.remove("a").unwrap();
        assert_eq!(removed.key(), "a");
        assert_eq!(cache.len(), 1);
        assert!(cache.remove("a").is_none());
        cache.check_consistency().unwrap();
    }

    #[test]
    fn test_clear() {
        let mut cache = LruCache::new(3, 0);
        put(&mut cache, "a");
        put(&mut cache, "b");

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
        put(&mut cache, "c");
        assert_eq!(keys(&cache), vec!["c"]);
        cache.check_consistency().unwrap();
    }

    #[test]
    fn test_teardown() {
        let mut cache = LruCache::new(3, 0);
        put(&mut cache, "a");
        put(&mut cache, "b");
        cache.teardown();
    }

    #[test]
    fn test_invalid_arguments_leave_cache_unchanged() {
        let mut cache = LruCache::new(3, 0);
        put(&mut cache, "a");

        assert!(matches!(
            cache.put("", "t", b""),
            Err(CacheError::InvalidArgument(_))
        ));
        assert!(matches!(
            cache.put_with_length("a", "t", b"abc", 10),
            Err(CacheError::InvalidArgument(_))
        ));

        assert_eq!(cache.get("a").unwrap().content(), b"a");
        assert_eq!(cache.stats().inserts, 1);
        cache.check_consistency().unwrap();
    }

    #[test]
    fn test_long_key_and_large_content_accepted_by_default() {
        let mut cache = LruCache::new(2, 0);
        let long_key = format!("/assets/{}", "a".repeat(300));
        let body = vec![7u8; 17 * 1024 * 1024];

        cache.put(&long_key, "text/plain", b"x").unwrap();
        cache.put("/big.bin", "application/octet-stream", &body).unwrap();

        assert_eq!(cache.get(&long_key).unwrap().content(), b"x");
        assert_eq!(cache.get("/big.bin").unwrap().content_length(), body.len());
    }

    #[test]
    fn test_key_limit_from_config() {
        let config = CacheConfig {
            max_key_length: 8,
            ..CacheConfig::default()
        };
        let mut cache = LruCache::from_config(&config);

        assert!(cache.put("12345678", "t", b"").is_ok());
        assert!(matches!(
            cache.put("123456789", "t", b""),
            Err(CacheError::InvalidArgument(_))
        ));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_content_limit_from_config() {
        let config = CacheConfig {
            max_content_length: 4,
            ..CacheConfig::default()
        };
        let mut cache = LruCache::from_config(&config);

        assert!(cache.put("a", "t", b"1234").is_ok());
        assert!(matches!(
            cache.put("b", "t", b"12345"),
            Err(CacheError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_stats() {
        let mut cache = LruCache::new(1, 0);
        put(&mut cache, "a");
        cache.get("a");
        cache.get("missing");
        put(&mut cache, "b");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_stale_index_handle_reports_miss() {
        let mut cache = LruCache::new(4, 0);
        put(&mut cache, "a");
        put(&mut cache, "b");

        // Free the entry behind the index's back
        let handle = cache.index.get("a").unwrap();
        cache.list.unlink(handle).unwrap();
        cache.cur_size -= 1;
        put(&mut cache, "c");

        assert!(cache.get("a").is_none());
        assert_eq!(cache.stats().misses, 1);
        assert!(cache.remove("a").is_none());
        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec!["c", "b"]);
    }

    /// Ordered index to exercise the trait seam.
    #[derive(Debug, Default)]
    struct OrderedIndex(BTreeMap<String, Handle>);

    impl KeyIndex for OrderedIndex {
        fn with_hint(_hint: usize) -> Self {
            Self::default()
        }

        fn put(&mut self, key: &str, handle: Handle) {
            self.0.insert(key.to_string(), handle);
        }

        fn get(&self, key: &str) -> Option<Handle> {
            self.0.get(key).copied()
        }

        fn delete(&mut self, key: &str) -> Option<Handle> {
            self.0.remove(key)
        }

        fn len(&self) -> usize {
            self.0.len()
        }

        fn clear(&mut self) {
            self.0.clear();
        }
    }

    #[test]
    fn test_custom_index() {
        let config = CacheConfig::default().with_max_entries(2);
        let mut cache = LruCache::with_index(&config, OrderedIndex::with_hint(0));

        cache.put("a", "t", b"1").unwrap();
        cache.put("b", "t", b"2").unwrap();
        cache.put("c", "t", b"3").unwrap();

        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("c").unwrap().content(), b"3");
        assert_eq!(cache.keys().collect::<Vec<_>>(), vec!["c", "b"]);
        cache.check_consistency().unwrap();
    }

    #[test]
    fn test_consistency_detects_swapped_handles() {
        let config = CacheConfig::default().with_max_entries(4);
        let mut cache = LruCache::with_index(&config, OrderedIndex::with_hint(0));
        cache.put("a", "t", b"1").unwrap();
        cache.put("b", "t", b"2").unwrap();
        cache.check_consistency().unwrap();

        let a = cache.index.0["a"];
        let b = cache.index.0["b"];
        cache.index.0.insert("a".to_string(), b);
        cache.index.0.insert("b".to_string(), a);

        assert!(matches!(
            cache.check_consistency(),
            Err(CacheError::PreconditionFailed(_))
        ));
    }
}
