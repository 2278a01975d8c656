//! # Resize / Linearize
//!
//! Growing the store is split into two primitives so that callers with their
//! own allocator can drive it:
//!
//! 1. [`linearize_to`](CircularBuffer::linearize_to) copies the circular
//!    layout into a fresh region, unwrapped so logical offset 0 sits at slot 0.
//! 2. [`sync_after_resize`](CircularBuffer::sync_after_resize) swaps that
//!    region in and resets the cursor.
//!
//! The two must run back to back with no other operation on the buffer in
//! between. [`resize`](CircularBuffer::resize) is that pair, fused, for stores
//! that allocate themselves.
//!
//! ```text
//! physical:    [....tail....][........head........]
//!              0         rs-1 rs               al-1
//!
//! linearized:  [........head........][....tail....][0 0 0 ... 0]
//!              0             al-rs-1  al-rs   al-1  al     new-1
//! ```

use crate::buffer::CircularBuffer;
use crate::error::Error;
use crate::store::{BackingStore, GrowableStore};

impl<S: BackingStore> CircularBuffer<S> {
    /// Unwrap the whole allocation into `dest` without touching the buffer.
    ///
    /// `dest[j]` receives logical offset `j` for `j < alloc_length`; bytes of
    /// `dest` past `alloc_length` are zeroed. Every slot is carried over, not
    /// just the prefix, so bytes written ahead of the prefix with
    /// [`write_byte`](Self::write_byte) survive the move. A `dest` shorter
    /// than the allocation receives only the first `dest.len()` logical bytes.
    pub fn linearize_to(&self, dest: &mut [u8]) {
        let store = self.store.as_ref();
        let (tail, head) = store.split_at(self.read_start);
        let copy_length = self.alloc_length.min(dest.len());

        if copy_length <= head.len() {
            dest[..copy_length].copy_from_slice(&head[..copy_length]);
        } else {
            dest[..head.len()].copy_from_slice(head);
            dest[head.len()..copy_length].copy_from_slice(&tail[..copy_length - head.len()]);
        }
        if dest.len() > self.alloc_length {
            dest[self.alloc_length..].fill(0);
        }
    }

    /// Swap in a store produced by [`linearize_to`](Self::linearize_to).
    ///
    /// Resets `read_start` to 0 and `alloc_length` to the new store's length;
    /// `prefix_length` is unchanged. Returns the replaced store so its owner
    /// can release it.
    ///
    /// # Panics
    /// Panics unless the new length is a power of two between the current
    /// `alloc_length` and `virtual_length`.
    pub fn sync_after_resize(&mut self, new_store: S) -> S {
        let new_alloc_length = new_store.as_ref().len();
        check_new_alloc_length(new_alloc_length, self.alloc_length, self.virtual_length);

        let old_store = core::mem::replace(&mut self.store, new_store);
        self.read_start = 0;
        self.alloc_length = new_alloc_length;
        self.check_invariants();
        old_store
    }

    /// Debug check that `linearized` holds every logical byte of the current
    /// layout at the same offset.
    #[cfg(debug_assertions)]
    fn check_linearized(&self, linearized: &[u8]) {
        let store = self.store.as_ref();
        for (offset, &byte) in linearized[..self.alloc_length].iter().enumerate() {
            let slot = crate::index::physical(self.read_start, offset, self.alloc_length);
            debug_assert_eq!(byte, store[slot], "logical offset {offset} moved during resize");
        }
    }
}

impl<S: GrowableStore> CircularBuffer<S> {
    /// Reallocate to `new_alloc_length` bytes and linearize.
    ///
    /// Afterwards `read_start == 0` and every logical offset holds the same
    /// byte as before.
    ///
    /// # Errors
    /// [`Error::AllocationFailure`] if the new store cannot be allocated. The
    /// buffer is untouched in that case.
    ///
    /// # Panics
    /// Panics unless `new_alloc_length` is a power of two between the current
    /// `alloc_length` and `virtual_length`.
    pub fn resize(&mut self, new_alloc_length: usize) -> Result<(), Error> {
        check_new_alloc_length(new_alloc_length, self.alloc_length, self.virtual_length);

        let mut new_store = S::allocate_zeroed(new_alloc_length).inspect_err(|_| {
            tracing::debug!(
                alloc_length = self.alloc_length,
                new_alloc_length,
                "resize allocation failed, buffer left unchanged"
            );
        })?;

        self.linearize_to(new_store.as_mut());
        #[cfg(debug_assertions)]
        self.check_linearized(new_store.as_ref());

        let old_alloc_length = self.alloc_length;
        drop(self.sync_after_resize(new_store));
        tracing::trace!(
            old_alloc_length,
            new_alloc_length,
            prefix_length = self.prefix_length,
            "circular buffer resized"
        );
        Ok(())
    }
}

fn check_new_alloc_length(new_alloc_length: usize, alloc_length: usize, virtual_length: usize) {
    assert!(
        new_alloc_length.is_power_of_two(),
        "new alloc length {new_alloc_length} is not a power of two"
    );
    assert!(
        new_alloc_length >= alloc_length,
        "new alloc length {new_alloc_length} shrinks allocation of {alloc_length}"
    );
    assert!(
        new_alloc_length <= virtual_length,
        "new alloc length {new_alloc_length} exceeds virtual length {virtual_length}"
    );
}
