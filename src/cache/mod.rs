//! Cache Module
//!
//! Provides a fixed-capacity in-memory cache with LRU eviction.

mod entry;
mod index;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use index::{HashIndex, KeyIndex, DEFAULT_INDEX_HINT};
pub use lru::{Handle, Iter, RecencyList};
pub use stats::CacheStats;
pub use store::LruCache;
