//! # Buffer State, Lifecycle, Point Access and Drain
//!
//! The handle itself plus every operation that touches at most one byte or
//! only moves the read cursor. Bulk copies live in `bulk.rs`, reallocation in
//! `resize.rs`.

use alloc::boxed::Box;
use core::fmt;

use crate::error::Error;
use crate::index::physical;
use crate::store::{BackingStore, GrowableStore};

/// Auto-growing circular byte buffer.
///
/// `S` is the backing store. [`HeapBuffer`] owns a heap box; any other
/// [`BackingStore`] can be adopted with [`CircularBuffer::from_external`].
///
/// # Invariants
///
/// - `alloc_length` and `virtual_length` are powers of two,
///   `alloc_length <= virtual_length`, and the store is exactly
///   `alloc_length` bytes.
/// - `read_start < alloc_length`.
/// - `prefix_length <= alloc_length`.
///
/// The buffer is not synchronized. All operations take `&self`/`&mut self`,
/// so the borrow checker supplies the required exclusive access.
#[derive(Clone)]
pub struct CircularBuffer<S = Box<[u8]>> {
    /// Physical backing array.
    pub(crate) store: S,

    /// Physical index of logical offset 0.
    pub(crate) read_start: usize,

    /// Physical capacity, always a power of two.
    pub(crate) alloc_length: usize,

    /// Contiguous readable bytes from logical offset 0.
    pub(crate) prefix_length: usize,

    /// Ceiling on `alloc_length`, fixed at construction.
    pub(crate) virtual_length: usize,
}

/// A circular buffer that allocates and owns its store on the global heap.
pub type HeapBuffer = CircularBuffer<Box<[u8]>>;

/// Raw view of the live state for zero-copy readers.
///
/// The prefix starts at `store[read_start]` and wraps at `alloc_length`. The
/// view borrows the buffer, so it cannot outlive the next mutation.
#[derive(Debug, Clone, Copy)]
pub struct InternalView<'a> {
    /// The whole physical store, `alloc_length` bytes.
    pub store: &'a [u8],
    /// Physical slot of logical offset 0.
    pub read_start: usize,
    /// Length of `store`; the wraparound point.
    pub alloc_length: usize,
}

// =============================================================================
// Lifecycle
// =============================================================================

impl<S: GrowableStore> CircularBuffer<S> {
    /// Allocate a zero-filled store of `alloc_length` bytes and wrap it.
    ///
    /// # Errors
    /// [`Error::AllocationFailure`] if the store cannot be allocated. No
    /// buffer exists in that case.
    ///
    /// # Panics
    /// Panics unless both lengths are powers of two and
    /// `alloc_length <= virtual_length`.
    pub fn initialize(alloc_length: usize, virtual_length: usize) -> Result<Self, Error> {
        check_lengths(alloc_length, virtual_length);
        let store = S::allocate_zeroed(alloc_length).inspect_err(|_| {
            tracing::debug!(alloc_length, virtual_length, "initial allocation failed");
        })?;
        Ok(Self::adopt(store, virtual_length))
    }
}

impl<S: BackingStore> CircularBuffer<S> {
    /// Wrap a store allocated by someone else.
    ///
    /// `alloc_length` becomes the store's length. The store is zeroed. It is
    /// handed back by [`into_store`](Self::into_store) or by
    /// [`sync_after_resize`](Self::sync_after_resize) and never freed
    /// behind the owner's back.
    ///
    /// # Panics
    /// Panics unless the store length and `virtual_length` are powers of two
    /// and the store is no longer than `virtual_length`.
    pub fn from_external(mut store: S, virtual_length: usize) -> Self {
        check_lengths(store.as_ref().len(), virtual_length);
        store.as_mut().fill(0);
        Self::adopt(store, virtual_length)
    }

    fn adopt(store: S, virtual_length: usize) -> Self {
        let cb = Self {
            alloc_length: store.as_ref().len(),
            store,
            read_start: 0,
            prefix_length: 0,
            virtual_length,
        };
        cb.check_invariants();
        cb
    }

    /// Release the backing store.
    ///
    /// Consumes the buffer, so a released buffer can never be touched again.
    #[inline]
    pub fn uninitialize(self) {
        drop(self);
    }

    /// Release the buffer but hand the store back to the caller.
    #[inline]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Contiguous readable bytes from logical offset 0.
    #[inline]
    pub fn prefix_length(&self) -> usize {
        self.prefix_length
    }

    /// Current physical capacity.
    #[inline]
    pub fn alloc_length(&self) -> usize {
        self.alloc_length
    }

    /// Ceiling on the physical capacity.
    #[inline]
    pub fn virtual_length(&self) -> usize {
        self.virtual_length
    }

    /// True when no contiguous bytes are readable.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prefix_length == 0
    }

    // =========================================================================
    // Point Access
    // =========================================================================

    /// Write one byte at logical `offset` and replace the prefix length.
    ///
    /// `new_prefix_length` is trusted: the caller tracks reception gaps and
    /// tells us how far the contiguous prefix now reaches. No gap bookkeeping
    /// happens here.
    ///
    /// # Panics
    /// Panics if `offset >= alloc_length` or
    /// `new_prefix_length > alloc_length`.
    pub fn write_byte(&mut self, offset: usize, byte: u8, new_prefix_length: usize) {
        assert!(
            offset < self.alloc_length,
            "write offset {offset} outside allocation of {}",
            self.alloc_length
        );
        assert!(
            new_prefix_length <= self.alloc_length,
            "prefix length {new_prefix_length} exceeds allocation of {}",
            self.alloc_length
        );
        let slot = physical(self.read_start, offset, self.alloc_length);
        self.store.as_mut()[slot] = byte;
        self.prefix_length = new_prefix_length;
        self.check_invariants();
    }

    /// Read the byte at logical `offset` inside the contiguous prefix.
    ///
    /// # Panics
    /// Panics if `offset >= prefix_length`.
    #[inline]
    pub fn read_byte(&self, offset: usize) -> u8 {
        assert!(
            offset < self.prefix_length,
            "read offset {offset} outside prefix of {}",
            self.prefix_length
        );
        self.store.as_ref()[physical(self.read_start, offset, self.alloc_length)]
    }

    // =========================================================================
    // Drain
    // =========================================================================

    /// Consume `drain_length` bytes from the front of the stream.
    ///
    /// # Panics
    /// Panics if `drain_length > prefix_length`.
    pub fn drain(&mut self, drain_length: usize) {
        assert!(
            drain_length <= self.prefix_length,
            "drain of {drain_length} bytes exceeds prefix of {}",
            self.prefix_length
        );
        self.read_start = physical(self.read_start, drain_length, self.alloc_length);
        self.prefix_length -= drain_length;
        self.check_invariants();
    }

    // =========================================================================
    // Zero-copy Access
    // =========================================================================

    /// Expose the store, read cursor and capacity without copying.
    #[inline]
    pub fn view(&self) -> InternalView<'_> {
        InternalView {
            store: self.store.as_ref(),
            read_start: self.read_start,
            alloc_length: self.alloc_length,
        }
    }

    /// The contiguous prefix as at most two slices in logical order.
    ///
    /// The second slice is empty unless the prefix wraps past the end of the
    /// store.
    pub fn segments(&self) -> (&[u8], &[u8]) {
        let view = self.view();
        let space_to_end = view.alloc_length - view.read_start;
        if self.prefix_length <= space_to_end {
            let end = view.read_start + self.prefix_length;
            (&view.store[view.read_start..end], &[])
        } else {
            (
                &view.store[view.read_start..],
                &view.store[..self.prefix_length - space_to_end],
            )
        }
    }

    /// Re-check the whole-state invariants. Compiled out in release builds.
    #[inline]
    pub(crate) fn check_invariants(&self) {
        debug_assert!(self.alloc_length.is_power_of_two());
        debug_assert!(self.virtual_length.is_power_of_two());
        debug_assert!(self.alloc_length <= self.virtual_length);
        debug_assert_eq!(self.store.as_ref().len(), self.alloc_length);
        debug_assert!(self.read_start < self.alloc_length);
        debug_assert!(self.prefix_length <= self.alloc_length);
    }
}

impl<S> fmt::Debug for CircularBuffer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircularBuffer")
            .field("read_start", &self.read_start)
            .field("alloc_length", &self.alloc_length)
            .field("prefix_length", &self.prefix_length)
            .field("virtual_length", &self.virtual_length)
            .finish_non_exhaustive()
    }
}

fn check_lengths(alloc_length: usize, virtual_length: usize) {
    assert!(
        alloc_length.is_power_of_two(),
        "alloc length {alloc_length} is not a power of two"
    );
    assert!(
        virtual_length.is_power_of_two(),
        "virtual length {virtual_length} is not a power of two"
    );
    assert!(
        alloc_length <= virtual_length,
        "alloc length {alloc_length} exceeds virtual length {virtual_length}"
    );
}
