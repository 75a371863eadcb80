//! Configuration Module
//!
//! Handles loading cache sizing and validation limits from environment variables.

use std::env;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Sizing hint for the key index, 0 selects the index default
    pub index_hint: usize,
    /// Longest accepted key in bytes, unbounded by default
    pub max_key_length: usize,
    /// Largest accepted payload in bytes, unbounded by default
    pub max_content_length: usize,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_INDEX_HINT` - Key index sizing hint (default: 0)
    /// - `CACHE_MAX_KEY_LENGTH` - Longest key in bytes (default: unbounded)
    /// - `CACHE_MAX_CONTENT_LENGTH` - Largest payload in bytes (default: unbounded)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("CACHE_MAX_ENTRIES", defaults.max_entries),
            index_hint: env_or("CACHE_INDEX_HINT", defaults.index_hint),
            max_key_length: env_or("CACHE_MAX_KEY_LENGTH", defaults.max_key_length),
            max_content_length: env_or("CACHE_MAX_CONTENT_LENGTH", defaults.max_content_length),
        }
    }

    /// Returns a copy with a different entry bound.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

fn env_or(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            index_hint: 0,
            max_key_length: usize::MAX,
            max_content_length: usize::MAX,
        }
    }
}
