//! Key Index Module
//!
//! Lookup structure from cache key to the [`Handle`] of its entry.

use std::collections::HashMap;

use ahash::RandomState;

use crate::cache::Handle;

/// Index size used when the caller passes a zero hint.
pub const DEFAULT_INDEX_HINT: usize = 128;

// == Key Index Contract ==
/// Key to handle mapping consumed by the cache.
///
/// `put` on an existing key overwrites the stored handle; the cache is
/// responsible for not leaking the entry the old handle pointed at.
/// Dropping the index destroys it.
pub trait KeyIndex {
    /// Creates an empty index sized for roughly `hint` keys (0 = default).
    fn with_hint(hint: usize) -> Self
    where
        Self: Sized;

    /// Registers `key`, replacing any previous handle.
    fn put(&mut self, key: &str, handle: Handle);

    /// Looks up `key`.
    fn get(&self, key: &str) -> Option<Handle>;

    /// Deregisters `key`, returning the handle it held.
    fn delete(&mut self, key: &str) -> Option<Handle>;

    /// Number of registered keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deregisters every key.
    fn clear(&mut self);
}

// == Hash Index ==
/// Default [`KeyIndex`] backed by a `HashMap` with the aHash hasher.
#[derive(Debug, Default)]
pub struct HashIndex {
    map: HashMap<String, Handle, RandomState>,
}

impl KeyIndex for HashIndex {
    fn with_hint(hint: usize) -> Self {
        let hint = if hint == 0 { DEFAULT_INDEX_HINT } else { hint };
        Self {
            map: HashMap::with_capacity_and_hasher(hint, RandomState::new()),
        }
    }

    fn put(&mut self, key: &str, handle: Handle) {
        self.map.insert(key.to_owned(), handle);
    }

    fn get(&self, key: &str) -> Option<Handle> {
        self.map.get(key).copied()
    }

    fn delete(&mut self, key: &str) -> Option<Handle> {
        self.map.remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }
}
