//! # Mapped Store
//!
//! An anonymous, private memory map used as a circular buffer's backing
//! store. Growth maps a fresh region, linearizes into it and unmaps the old
//! one; the mapping is released when the store is dropped.

use std::fmt;
use std::io;

use memmap2::MmapMut;

use vcb_core::{CircularBuffer, Error, GrowableStore};

/// A circular buffer backed by anonymous memory maps.
pub type MappedBuffer = CircularBuffer<MappedStore>;

/// Anonymous read-write mapping of a fixed length.
pub struct MappedStore {
    /// The mapping. Zero-filled by the kernel on creation.
    mmap: MmapMut,
}

impl MappedStore {
    /// Map `len` zeroed bytes.
    pub fn anonymous(len: usize) -> io::Result<Self> {
        let mmap = MmapMut::map_anon(len)?;
        Ok(Self { mmap })
    }

    /// Length of the mapping in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

impl AsRef<[u8]> for MappedStore {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.mmap
    }
}

impl AsMut<[u8]> for MappedStore {
    #[inline]
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.mmap
    }
}

impl GrowableStore for MappedStore {
    fn allocate_zeroed(len: usize) -> Result<Self, Error> {
        Self::anonymous(len).map_err(|err| {
            tracing::warn!(len, error = %err, "anonymous mapping failed");
            Error::AllocationFailure { requested: len }
        })
    }
}

impl fmt::Debug for MappedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedStore")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(cb: &MappedBuffer) -> Vec<u8> {
        let mut out = vec![0u8; cb.prefix_length()];
        cb.read_buffer(&mut out);
        out
    }

    #[test]
    fn test_anonymous_map_is_zeroed() {
        let store = MappedStore::anonymous(4096).unwrap();
        assert_eq!(store.len(), 4096);
        assert!(store.as_ref().iter().all(|&b| b == 0));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_unmappable_length_reports_allocation_failure() {
        // Larger than any user address space the kernel hands out.
        let err = MappedBuffer::initialize(1 << 62, 1 << 62).unwrap_err();
        assert_eq!(err, Error::AllocationFailure { requested: 1 << 62 });
    }

    #[test]
    fn test_mapped_buffer_grows_across_maps() {
        let mut cb = MappedBuffer::initialize(4096, 1 << 16).unwrap();
        let chunk: Vec<u8> = (0..3000u32).map(|i| i as u8).collect();
        cb.write_buffer(&chunk).unwrap();
        cb.drain(2500);
        cb.write_buffer(&chunk).unwrap();
        cb.write_buffer(&chunk).unwrap();
        assert_eq!(cb.alloc_length(), 8192);
        assert_eq!(cb.prefix_length(), 6500);

        let expected: Vec<u8> = chunk[2500..]
            .iter()
            .chain(chunk.iter())
            .chain(chunk.iter())
            .copied()
            .collect();
        assert_eq!(contents(&cb), expected);
    }

    #[test]
    fn test_externally_driven_resize() {
        let mut cb = MappedBuffer::from_external(MappedStore::anonymous(8).unwrap(), 32);
        cb.append(b"abcdefgh");
        cb.drain(6);

        let new_alloc_length = cb.grow_target(10).unwrap();
        assert_eq!(new_alloc_length, 16);
        let mut next = MappedStore::anonymous(new_alloc_length).unwrap();
        cb.linearize_to(next.as_mut());
        let old = cb.sync_after_resize(next);
        assert_eq!(old.len(), 8);
        drop(old);

        cb.append(b"ijklmnopqr");
        assert_eq!(contents(&cb), b"ghijklmnopqr");
    }
}
