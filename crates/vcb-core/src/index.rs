//! # Index Arithmetic
//!
//! The single definition of the logical → physical mapping and of the
//! power-of-two growth step. Nothing else in the crate does modular index
//! math inline.

/// Physical slot of logical `offset` for a ring starting at `read_start`.
///
/// Total for `alloc_length > 0`.
#[inline]
pub const fn physical(read_start: usize, offset: usize, alloc_length: usize) -> usize {
    (read_start + offset) % alloc_length
}

/// Largest power of two representable in a `usize`.
const MAX_ALLOC_LENGTH: usize = 1 << (usize::BITS - 1);

/// Smallest doubling of `alloc_length` that holds `needed` bytes.
///
/// Returns `alloc_length` unchanged when it already suffices. With
/// `alloc_length` a power of two and `needed <= virtual_length` for some
/// power-of-two `virtual_length >= alloc_length`, the result never exceeds
/// `virtual_length` (no-overcommit).
///
/// # Panics
/// Panics if `needed` exceeds the largest power of two a `usize` can hold.
#[inline]
pub fn next_alloc_length(alloc_length: usize, needed: usize) -> usize {
    debug_assert!(alloc_length.is_power_of_two());
    assert!(
        needed <= MAX_ALLOC_LENGTH,
        "needed length {needed} exceeds the largest power of two {MAX_ALLOC_LENGTH}"
    );
    let mut new_alloc_length = alloc_length;
    while new_alloc_length < needed {
        new_alloc_length += new_alloc_length;
    }
    new_alloc_length
}

// =============================================================================
// Kani Proofs: Index Arithmetic
// =============================================================================

#[cfg(kani)]
mod proofs {
    use super::*;

    /// **Proof: every logical offset maps inside the allocation**
    #[kani::proof]
    fn verify_physical_in_bounds() {
        let shift: u32 = kani::any();
        kani::assume(shift <= 20);
        let alloc_length = 1usize << shift;

        let read_start: usize = kani::any();
        let offset: usize = kani::any();
        kani::assume(read_start < alloc_length);
        kani::assume(offset < alloc_length);

        assert!(physical(read_start, offset, alloc_length) < alloc_length);
    }

    /// **Proof: distinct logical offsets never share a slot**
    #[kani::proof]
    fn verify_physical_injective() {
        let shift: u32 = kani::any();
        kani::assume(shift <= 20);
        let alloc_length = 1usize << shift;

        let read_start: usize = kani::any();
        let a: usize = kani::any();
        let b: usize = kani::any();
        kani::assume(read_start < alloc_length);
        kani::assume(a < alloc_length && b < alloc_length && a != b);

        assert!(physical(read_start, a, alloc_length) != physical(read_start, b, alloc_length));
    }

    /// **Proof: no-overcommit**
    ///
    /// Doubling from any power-of-two allocation reaches a power of two that
    /// covers `needed` without passing the virtual ceiling, and it is the
    /// smallest such doubling.
    #[kani::proof]
    #[kani::unwind(18)]
    fn verify_no_overcommit() {
        let alloc_shift: u32 = kani::any();
        let virtual_shift: u32 = kani::any();
        kani::assume(alloc_shift <= virtual_shift && virtual_shift <= 16);
        let alloc_length = 1usize << alloc_shift;
        let virtual_length = 1usize << virtual_shift;

        let needed: usize = kani::any();
        kani::assume(needed <= virtual_length);

        let grown = next_alloc_length(alloc_length, needed);
        assert!(grown.is_power_of_two());
        assert!(grown >= needed && grown >= alloc_length);
        assert!(grown <= virtual_length);
        assert!(grown == alloc_length || grown / 2 < needed);
    }
}
