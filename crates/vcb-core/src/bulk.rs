//! # Bulk Access
//!
//! Append after the contiguous prefix and copy the prefix out. Both paths
//! move at most two contiguous runs: up to the end of the store, then from
//! slot 0.

use crate::buffer::CircularBuffer;
use crate::error::Error;
use crate::index::{next_alloc_length, physical};
use crate::store::{BackingStore, GrowableStore};

impl<S: BackingStore> CircularBuffer<S> {
    /// Allocation needed before `write_length` more bytes can be appended.
    ///
    /// `None` when the current allocation already holds
    /// `prefix_length + write_length` bytes, otherwise the smallest doubling
    /// of `alloc_length` that does. Callers that manage their own stores use
    /// this to size the region they pass to
    /// [`sync_after_resize`](Self::sync_after_resize).
    ///
    /// # Panics
    /// Panics if `prefix_length + write_length > virtual_length`. Bounding
    /// writes by the virtual length is the caller's flow-control duty.
    pub fn grow_target(&self, write_length: usize) -> Option<usize> {
        let needed = self.prefix_length.saturating_add(write_length);
        assert!(
            needed <= self.virtual_length,
            "write of {write_length} bytes after prefix {} exceeds virtual length {}",
            self.prefix_length,
            self.virtual_length
        );
        (needed > self.alloc_length).then(|| next_alloc_length(self.alloc_length, needed))
    }

    /// Copy `source` in right after the prefix without growing.
    ///
    /// The region being appended into must be gapless: every byte of it
    /// becomes part of the prefix. Returns `true` if any bytes were written.
    ///
    /// # Panics
    /// Panics if `prefix_length + source.len() > alloc_length`.
    pub fn append(&mut self, source: &[u8]) -> bool {
        let write_length = source.len();
        assert!(
            write_length <= self.alloc_length - self.prefix_length,
            "append of {write_length} bytes after prefix {} overflows allocation of {}",
            self.prefix_length,
            self.alloc_length
        );

        let write_start = physical(self.read_start, self.prefix_length, self.alloc_length);
        let space_to_end = self.alloc_length - write_start;
        let store = self.store.as_mut();
        if write_length <= space_to_end {
            store[write_start..write_start + write_length].copy_from_slice(source);
        } else {
            let (head, tail) = source.split_at(space_to_end);
            store[write_start..].copy_from_slice(head);
            store[..tail.len()].copy_from_slice(tail);
        }

        self.prefix_length += write_length;
        self.check_invariants();
        write_length > 0
    }

    /// Copy the first `destination.len()` logical bytes into `destination`.
    ///
    /// # Panics
    /// Panics if `destination.len() > prefix_length`.
    pub fn read_buffer(&self, destination: &mut [u8]) {
        let read_length = destination.len();
        assert!(
            read_length <= self.prefix_length,
            "read of {read_length} bytes exceeds prefix of {}",
            self.prefix_length
        );

        let (head, tail) = self.segments();
        let first = read_length.min(head.len());
        destination[..first].copy_from_slice(&head[..first]);
        destination[first..].copy_from_slice(&tail[..read_length - first]);
    }
}

impl<S: GrowableStore> CircularBuffer<S> {
    /// Append `source` after the prefix, growing the store if needed.
    ///
    /// Growth doubles `alloc_length` until `prefix_length + source.len()`
    /// fits and performs a single [`resize`](Self::resize) to that size.
    /// Returns `Ok(false)` for an empty `source`.
    ///
    /// # Errors
    /// [`Error::AllocationFailure`] if growth fails. Nothing is written and the
    /// buffer is unchanged.
    ///
    /// # Panics
    /// Panics if `prefix_length + source.len() > virtual_length`.
    pub fn write_buffer(&mut self, source: &[u8]) -> Result<bool, Error> {
        if let Some(new_alloc_length) = self.grow_target(source.len()) {
            self.resize(new_alloc_length)?;
        }
        Ok(self.append(source))
    }
}
