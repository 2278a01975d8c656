//! # vcb-core — Verified Circular Buffer
//!
//! The byte store underneath a stream reassembly buffer. Bytes arrive by
//! logical offset, the upper layer tells us how long the contiguous readable
//! prefix is, and we keep that prefix addressable while the physical
//! allocation doubles (up to a fixed virtual ceiling) underneath it.
//!
//! # State
//!
//! | Field            | Meaning                                              |
//! |------------------|------------------------------------------------------|
//! | `read_start`     | physical slot of logical offset 0                    |
//! | `alloc_length`   | physical capacity, always a power of two             |
//! | `prefix_length`  | contiguous valid bytes starting at logical offset 0  |
//! | `virtual_length` | immutable power-of-two ceiling on `alloc_length`     |
//!
//! Logical offset `o` lives at [`physical`]`(read_start, o, alloc_length)`.
//! Every mutation keeps previously written bytes at their logical offsets.
//!
//! # Contracts
//!
//! Offset and length preconditions are programming errors and panic. The only
//! recoverable failure is [`Error::AllocationFailure`], and it leaves the
//! buffer exactly as it was. Whole-state invariants are re-checked after every
//! mutation in debug builds.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod buffer;
mod bulk;
mod error;
mod index;
mod resize;
mod store;

#[cfg(test)]
mod model_tests;
#[cfg(test)]
mod test_support;

pub use buffer::{CircularBuffer, HeapBuffer, InternalView};
pub use error::Error;
pub use index::{next_alloc_length, physical};
pub use store::{BackingStore, GrowableStore};
