//! Recency List Module
//!
//! Doubly linked list over cache entries, ordered most recently used (head)
//! to least recently used (tail).
//!
//! Entries live in a single arena of slots addressed by [`Handle`]; links are
//! handles rather than references so the key index can point at the same
//! entry without aliasing it. All operations are O(1).
//!
//! Each slot carries a generation that is bumped when its entry is freed, so a
//! handle kept past `unlink`/`remove_tail`/`clear` is rejected even after the
//! slot has been reused.

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

// == Handle ==
/// Position of an entry inside the list's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: usize,
    generation: u64,
}

/// Arena slot: an entry plus its links.
#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    prev: Option<Handle>,
    next: Option<Handle>,
}

/// Arena cell; `generation` outlives the slot it guards.
#[derive(Debug, Default)]
struct Cell {
    generation: u64,
    slot: Option<Slot>,
}

// == Recency List ==
/// Intrusive doubly linked list over an arena of entries.
///
/// The list only relinks; size accounting belongs to the cache that owns it.
#[derive(Debug, Default)]
pub struct RecencyList {
    slots: Vec<Cell>,
    free: Vec<usize>,
    head: Option<Handle>,
    tail: Option<Handle>,
}

impl RecencyList {
    // == Constructor ==
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty list with room for `capacity` entries before the arena grows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Most recently used entry.
    pub fn head(&self) -> Option<Handle> {
        self.head
    }

    /// Least recently used entry.
    pub fn tail(&self) -> Option<Handle> {
        self.tail
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Borrows the entry at `handle`, if the slot is live.
    pub fn get(&self, handle: Handle) -> Option<&CacheEntry> {
        self.slot(handle).map(|slot| &slot.entry)
    }

    // == Insert Head ==
    /// Stores `entry` and links it as the new head.
    pub fn insert_head(&mut self, entry: CacheEntry) -> Handle {
        let handle = self.alloc(Slot {
            entry,
            prev: None,
            next: None,
        });
        self.link_head(handle);
        handle
    }

    // == Move To Head ==
    /// Promotes `handle` to the head. Already-head is a no-op.
    pub fn move_to_head(&mut self, handle: Handle) -> Result<()> {
        if self.slot(handle).is_none() {
            return Err(stale(handle));
        }
        if self.head == Some(handle) {
            return Ok(());
        }

        self.detach(handle);
        self.link_head(handle);
        Ok(())
    }

    // == Remove Tail ==
    /// Detaches the tail and returns it together with its former handle.
    ///
    /// # Errors
    /// `PreconditionFailed` when the list is empty.
    pub fn remove_tail(&mut self) -> Result<(Handle, CacheEntry)> {
        let tail = self.tail.ok_or_else(|| {
            CacheError::PreconditionFailed("remove_tail on an empty list".to_string())
        })?;
        let entry = self.unlink(tail)?;
        Ok((tail, entry))
    }

    // == Unlink ==
    /// Detaches the entry at `handle` from anywhere in the list and frees its slot.
    pub fn unlink(&mut self, handle: Handle) -> Result<CacheEntry> {
        if self.slot(handle).is_none() {
            return Err(stale(handle));
        }

        self.detach(handle);
        self.release(handle.index).ok_or_else(|| stale(handle))
    }

    // == Clear ==
    /// Drops every entry, walking from head to tail.
    ///
    /// Cells are kept so handles issued before the clear stay stale.
    pub fn clear(&mut self) {
        let mut cursor = self.head;
        while let Some(handle) = cursor {
            cursor = self.slot(handle).and_then(|slot| slot.next);
            self.release(handle.index);
        }
        self.head = None;
        self.tail = None;
    }

    // == Iter ==
    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn slot(&self, handle: Handle) -> Option<&Slot> {
        self.slots
            .get(handle.index)
            .filter(|cell| cell.generation == handle.generation)
            .and_then(|cell| cell.slot.as_ref())
    }

    fn slot_mut(&mut self, handle: Handle) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.index)
            .filter(|cell| cell.generation == handle.generation)
            .and_then(|cell| cell.slot.as_mut())
    }

    fn alloc(&mut self, slot: Slot) -> Handle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Cell::default());
                self.slots.len() - 1
            }
        };
        let cell = &mut self.slots[index];
        cell.slot = Some(slot);
        Handle {
            index,
            generation: cell.generation,
        }
    }

    /// Empties a cell, invalidating every handle to it.
    fn release(&mut self, index: usize) -> Option<CacheEntry> {
        let cell = self.slots.get_mut(index)?;
        let slot = cell.slot.take()?;
        cell.generation += 1;
        self.free.push(index);
        Some(slot.entry)
    }

    /// Splices a detached live slot in front of the current head.
    fn link_head(&mut self, handle: Handle) {
        let old_head = self.head;
        if let Some(slot) = self.slot_mut(handle) {
            slot.prev = None;
            slot.next = old_head;
        }

        match old_head {
            Some(old) => {
                if let Some(slot) = self.slot_mut(old) {
                    slot.prev = Some(handle);
                }
            }
            None => self.tail = Some(handle),
        }
        self.head = Some(handle);
    }

    /// Relinks the neighbours of `handle` to each other, leaving it dangling.
    fn detach(&mut self, handle: Handle) {
        let (prev, next) = match self.slot(handle) {
            Some(slot) => (slot.prev, slot.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(slot) = self.slot_mut(p) {
                    slot.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(n) => {
                if let Some(slot) = self.slot_mut(n) {
                    slot.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(slot) = self.slot_mut(handle) {
            slot.prev = None;
            slot.next = None;
        }
    }

    // == Invariant Check ==
    /// Walks the list both ways and returns the entry count if the links agree.
    pub fn check_links(&self) -> Result<usize> {
        let broken = |what: &str| CacheError::PreconditionFailed(format!("broken list: {what}"));

        let mut forward = Vec::new();
        let mut cursor = self.head;
        let mut prev = None;
        while let Some(handle) = cursor {
            let slot = self.slot(handle).ok_or_else(|| broken("dangling next"))?;
            if slot.prev != prev {
                return Err(broken("prev does not mirror next"));
            }
            forward.push(handle);
            if forward.len() > self.slots.len() {
                return Err(broken("cycle"));
            }
            prev = Some(handle);
            cursor = slot.next;
        }
        if prev != self.tail {
            return Err(broken("forward walk does not end at tail"));
        }

        let mut backward = Vec::with_capacity(forward.len());
        let mut cursor = self.tail;
        while let Some(handle) = cursor {
            let slot = self.slot(handle).ok_or_else(|| broken("dangling prev"))?;
            backward.push(handle);
            if backward.len() > forward.len() {
                return Err(broken("backward walk is longer"));
            }
            cursor = slot.prev;
        }
        backward.reverse();
        if backward != forward {
            return Err(broken("walks disagree"));
        }

        let live = self.slots.iter().filter(|c| c.slot.is_some()).count();
        if live != forward.len() {
            return Err(broken("unlinked live slot"));
        }
        Ok(forward.len())
    }
}

fn stale(handle: Handle) -> CacheError {
    CacheError::PreconditionFailed(format!(
        "stale handle {}@{}",
        handle.index, handle.generation
    ))
}

// == Iterator ==
/// Head-to-tail iterator over a [`RecencyList`].
pub struct Iter<'a> {
    list: &'a RecencyList,
    cursor: Option<Handle>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a CacheEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.list.slot(self.cursor?)?;
        self.cursor = slot.next;
        Some(&slot.entry)
    }
}
