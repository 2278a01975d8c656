/// Errors returned by the circular buffer.
///
/// Precondition violations are not represented here; they panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The backing-store allocator could not satisfy a request.
    ///
    /// Raised by initialization and by every growth path. The buffer that
    /// requested the allocation is left unmodified.
    #[error("backing store allocation of {requested} bytes failed")]
    AllocationFailure {
        /// Number of bytes requested from the allocator.
        requested: usize,
    },
}
