//! Stores shared by unit tests.

use alloc::vec::Vec;

use crate::error::Error;
use crate::store::GrowableStore;

/// A store whose allocations always fail.
pub(crate) struct Exhausted(pub(crate) Vec<u8>);

impl AsRef<[u8]> for Exhausted {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsMut<[u8]> for Exhausted {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl GrowableStore for Exhausted {
    fn allocate_zeroed(len: usize) -> Result<Self, Error> {
        Err(Error::AllocationFailure { requested: len })
    }
}
