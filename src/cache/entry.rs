//! Cache Entry Module
//!
//! Defines the record stored for each cached key.

use crate::error::{CacheError, Result};

// == Cache Entry ==
/// A single cached payload with its key and content-type label.
///
/// Every buffer is owned by the entry; the cache never aliases caller memory.
/// Entries are immutable once created and are released when dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    key: String,
    content_type: String,
    content: Vec<u8>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry holding a copy of the whole `content` slice.
    pub fn new(key: &str, content_type: &str, content: &[u8]) -> Result<Self> {
        Self::with_length(key, content_type, content, content.len())
    }

    // == Constructor With Length ==
    /// Creates an entry holding a copy of the first `length` bytes of `content`.
    ///
    /// # Errors
    /// - `InvalidArgument` if `length` exceeds `content.len()`
    /// - `AllocationFailed` if the payload buffer cannot be reserved
    pub fn with_length(
        key: &str,
        content_type: &str,
        content: &[u8],
        length: usize,
    ) -> Result<Self> {
        let Some(source) = content.get(..length) else {
            return Err(CacheError::InvalidArgument(format!(
                "length {} exceeds the {} bytes supplied",
                length,
                content.len()
            )));
        };

        let mut buf = Vec::new();
        buf.try_reserve_exact(length)
            .map_err(|_| CacheError::AllocationFailed { bytes: length })?;
        buf.extend_from_slice(source);

        Ok(Self {
            key: key.to_owned(),
            content_type: content_type.to_owned(),
            content: buf,
        })
    }

    /// The key this entry is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The opaque content-type label.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The stored payload.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Payload length in bytes.
    pub fn content_length(&self) -> usize {
        self.content.len()
    }
}
