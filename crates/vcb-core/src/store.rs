//! Backing stores.
//!
//! A buffer never cares where its bytes live, only that it can read and write
//! them as one slice. Stores that can also produce fresh zeroed regions
//! implement [`GrowableStore`] and unlock the self-allocating paths
//! (`initialize`, `resize`, `write_buffer`).

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::Error;

/// A contiguous region of bytes a buffer can live in.
///
/// Blanket-implemented for owned boxes, `Vec<u8>`, borrowed `&mut [u8]`
/// regions and any other type exposing its bytes as a slice.
pub trait BackingStore: AsRef<[u8]> + AsMut<[u8]> {}

impl<T: AsRef<[u8]> + AsMut<[u8]>> BackingStore for T {}

/// A backing store that knows how to allocate another instance of itself.
pub trait GrowableStore: BackingStore + Sized {
    /// Allocate `len` zero-filled bytes.
    ///
    /// # Errors
    /// [`Error::AllocationFailure`] when the allocator cannot provide `len`
    /// bytes. Must not abort the process.
    fn allocate_zeroed(len: usize) -> Result<Self, Error>;
}

impl GrowableStore for Vec<u8> {
    fn allocate_zeroed(len: usize) -> Result<Self, Error> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| Error::AllocationFailure { requested: len })?;
        bytes.resize(len, 0);
        Ok(bytes)
    }
}

impl GrowableStore for Box<[u8]> {
    fn allocate_zeroed(len: usize) -> Result<Self, Error> {
        Vec::<u8>::allocate_zeroed(len).map(Vec::into_boxed_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_store_is_zeroed() {
        let store = <Box<[u8]>>::allocate_zeroed(64).unwrap();
        assert_eq!(store.len(), 64);
        assert!(store.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_impossible_allocation_is_reported() {
        let err = Vec::<u8>::allocate_zeroed(usize::MAX).unwrap_err();
        assert_eq!(
            err,
            Error::AllocationFailure {
                requested: usize::MAX
            }
        );
    }
}
