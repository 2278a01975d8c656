//! # vcb-io — Memory-Mapped Backing Stores
//!
//! Lets a circular buffer live in anonymous `mmap` regions instead of the
//! global heap. The kernel hands out zeroed pages lazily, so a large
//! allocation costs nothing until it is touched.

pub mod mapped;

pub use mapped::{MappedBuffer, MappedStore};
