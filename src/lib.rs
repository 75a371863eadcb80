//! Content Cache - An embeddable in-memory LRU cache
//!
//! Maps string keys to owned byte payloads tagged with a content-type label,
//! evicting the least recently used entry once the configured capacity is
//! exceeded. Intended to sit in front of a slower data source.
//!
//! ```
//! use content_cache::LruCache;
//!
//! let mut cache = LruCache::new(2, 0);
//! cache.put("/index.html", "text/html", b"<h1>hello</h1>").unwrap();
//!
//! let entry = cache.get("/index.html").unwrap();
//! assert_eq!(entry.content_type(), "text/html");
//! assert_eq!(entry.content(), b"<h1>hello</h1>");
//! ```

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheEntry, CacheStats, HashIndex, KeyIndex, LruCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
