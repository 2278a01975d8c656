//! # vcb-verify — Proofs for the Verified Circular Buffer
//!
//! Kani harnesses (compiled only under `cfg(kani)`) and bounded exhaustive
//! checks (plain `cargo test`) for the buffer's contracts:
//!
//! - **Index coherence**: every written, undrained logical offset reads back
//!   the last byte written there, across drains and resizes.
//! - **Drain monotonicity**: draining `n` shrinks the prefix by exactly `n`
//!   and shifts the remaining bytes to the front.
//! - **No-overcommit**: growth reaches the smallest sufficient power of two
//!   and never exceeds the virtual length.
//!
//! Run the proofs with `cargo kani --package vcb-verify`.

use std::collections::VecDeque;

use vcb_core::{BackingStore, CircularBuffer};

/// The logical stream a buffer is supposed to hold, kept linearly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceModel {
    bytes: VecDeque<u8>,
}

impl ReferenceModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.bytes.extend(bytes.iter().copied());
    }

    pub fn drain(&mut self, n: usize) {
        self.bytes.drain(..n);
    }

    pub fn overwrite(&mut self, offset: usize, byte: u8) {
        self.bytes[offset] = byte;
    }

    /// First logical offset where `cb` disagrees with the model, if any.
    ///
    /// A length mismatch reports the shorter length.
    pub fn first_divergence<S: BackingStore>(&self, cb: &CircularBuffer<S>) -> Option<usize> {
        if cb.prefix_length() != self.len() {
            return Some(cb.prefix_length().min(self.len()));
        }
        self.bytes
            .iter()
            .enumerate()
            .find(|&(offset, &byte)| cb.read_byte(offset) != byte)
            .map(|(offset, _)| offset)
    }
}

/// Allocation a doubling buffer must settle on after growing from
/// `alloc_length` to hold `needed` bytes.
pub fn minimal_alloc_length(alloc_length: usize, needed: usize) -> usize {
    needed.next_power_of_two().max(alloc_length)
}

// =============================================================================
// Kani Proofs
// =============================================================================

#[cfg(kani)]
mod proofs {
    use super::*;
    use vcb_core::HeapBuffer;

    /// **Proof: drain monotonicity**
    ///
    /// After writing 4 symbolic bytes and draining a symbolic `n`, the prefix
    /// is `4 - n` long and starts with the byte that was at offset `n`.
    #[kani::proof]
    #[kani::unwind(6)]
    fn verify_drain_monotonicity() {
        let bytes: [u8; 4] = kani::any();
        let drained: usize = kani::any();
        kani::assume(drained <= 4);

        let Ok(mut cb) = HeapBuffer::initialize(4, 8) else {
            return;
        };
        assert!(cb.write_buffer(&bytes).is_ok());
        cb.drain(drained);

        assert!(cb.prefix_length() == 4 - drained);
        for offset in 0..cb.prefix_length() {
            assert!(cb.read_byte(offset) == bytes[drained + offset]);
        }
    }

    /// **Proof: wraparound writes keep physical-logical coherence**
    ///
    /// Write, drain (leaving the cursor anywhere), write again with or without
    /// growth: the logical stream is the concatenation of what remains.
    #[kani::proof]
    #[kani::unwind(10)]
    fn verify_wrapped_write_coherence() {
        let first: [u8; 4] = kani::any();
        let second: [u8; 4] = kani::any();
        let first_length: usize = kani::any();
        let drained: usize = kani::any();
        let second_length: usize = kani::any();
        kani::assume(first_length <= 4 && drained <= first_length && second_length <= 4);

        let Ok(mut cb) = HeapBuffer::initialize(4, 8) else {
            return;
        };
        assert!(cb.write_buffer(&first[..first_length]).is_ok());
        cb.drain(drained);
        if cb.write_buffer(&second[..second_length]).is_err() {
            return;
        }

        let kept = first_length - drained;
        assert!(cb.prefix_length() == kept + second_length);
        for offset in 0..cb.prefix_length() {
            let expected = if offset < kept {
                first[drained + offset]
            } else {
                second[offset - kept]
            };
            assert!(cb.read_byte(offset) == expected);
        }
    }

    /// **Proof: resize linearizes without moving any logical byte**
    #[kani::proof]
    #[kani::unwind(10)]
    fn verify_resize_preserves_logical_offsets() {
        let bytes: [u8; 4] = kani::any();
        let drained: usize = kani::any();
        let refill: usize = kani::any();
        kani::assume(drained <= 4 && refill <= drained);

        let Ok(mut cb) = HeapBuffer::initialize(4, 8) else {
            return;
        };
        assert!(cb.write_buffer(&bytes).is_ok());
        cb.drain(drained);
        assert!(cb.write_buffer(&bytes[..refill]).is_ok());

        let mut before = [0u8; 4];
        cb.read_buffer(&mut before[..cb.prefix_length()]);
        if cb.resize(8).is_err() {
            return;
        }

        assert!(cb.view().read_start == 0);
        assert!(cb.alloc_length() == 8);
        for offset in 0..cb.prefix_length() {
            assert!(cb.read_byte(offset) == before[offset]);
        }
    }

    /// **Proof: growth settles on the smallest sufficient power of two**
    #[kani::proof]
    #[kani::unwind(20)]
    fn verify_growth_is_minimal() {
        let first_length: usize = kani::any();
        let second_length: usize = kani::any();
        kani::assume(first_length <= 8 && second_length <= 8);

        let Ok(mut cb) = HeapBuffer::initialize(1, 16) else {
            return;
        };
        let zeros = [0u8; 8];
        if cb.write_buffer(&zeros[..first_length]).is_err() {
            return;
        }
        let after_first = cb.alloc_length();
        assert!(after_first == minimal_alloc_length(1, first_length));

        if cb.write_buffer(&zeros[..second_length]).is_err() {
            return;
        }
        assert!(cb.alloc_length() == minimal_alloc_length(after_first, first_length + second_length));
        assert!(cb.alloc_length() <= cb.virtual_length());
    }

    /// **Proof: out-of-order point writes land at their logical offsets**
    #[kani::proof]
    #[kani::unwind(6)]
    fn verify_point_write_coherence() {
        let drained: usize = kani::any();
        let offset: usize = kani::any();
        let byte: u8 = kani::any();
        kani::assume(drained <= 4 && offset < 4);

        let Ok(mut cb) = HeapBuffer::initialize(4, 4) else {
            return;
        };
        assert!(cb.write_buffer(&[0; 4]).is_ok());
        cb.drain(drained);

        // The caller's gap tracker says the whole allocation is now valid.
        cb.write_byte(offset, byte, 4);
        assert!(cb.read_byte(offset) == byte);
    }
}

// =============================================================================
// Bounded Exhaustive Checks
// =============================================================================

#[cfg(test)]
mod exhaustive {
    use super::*;
    use vcb_core::HeapBuffer;

    const VIRTUAL_LENGTH: usize = 8;
    const DEPTH: usize = 5;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Write(usize),
        Drain(usize),
        Double,
        Overwrite(usize),
    }

    const OPS: [Op; 12] = [
        Op::Write(0),
        Op::Write(1),
        Op::Write(2),
        Op::Write(3),
        Op::Write(5),
        Op::Drain(0),
        Op::Drain(1),
        Op::Drain(2),
        Op::Drain(3),
        Op::Double,
        Op::Overwrite(0),
        Op::Overwrite(2),
    ];

    #[derive(Clone)]
    struct State {
        cb: HeapBuffer,
        model: ReferenceModel,
        next_byte: u8,
    }

    impl State {
        fn new(alloc_length: usize) -> Self {
            Self {
                cb: HeapBuffer::initialize(alloc_length, VIRTUAL_LENGTH).unwrap(),
                model: ReferenceModel::new(),
                next_byte: 1,
            }
        }

        fn bytes(&mut self, n: usize) -> Vec<u8> {
            (0..n)
                .map(|_| {
                    let byte = self.next_byte;
                    self.next_byte = self.next_byte.wrapping_add(1);
                    byte
                })
                .collect()
        }

        /// Apply `op` if its preconditions hold; `false` if it was skipped.
        fn apply(&mut self, op: Op) -> bool {
            match op {
                Op::Write(n) => {
                    if self.model.len() + n > VIRTUAL_LENGTH {
                        return false;
                    }
                    let old_alloc_length = self.cb.alloc_length();
                    let bytes = self.bytes(n);
                    assert_eq!(self.cb.write_buffer(&bytes).unwrap(), n > 0);
                    self.model.append(&bytes);
                    assert_eq!(
                        self.cb.alloc_length(),
                        minimal_alloc_length(old_alloc_length, self.model.len())
                    );
                }
                Op::Drain(n) => {
                    if n > self.model.len() {
                        return false;
                    }
                    self.cb.drain(n);
                    self.model.drain(n);
                }
                Op::Double => {
                    let target = self.cb.alloc_length() * 2;
                    if target > VIRTUAL_LENGTH {
                        return false;
                    }
                    self.cb.resize(target).unwrap();
                    assert_eq!(self.cb.view().read_start, 0);
                }
                Op::Overwrite(offset) => {
                    if offset >= self.model.len() {
                        return false;
                    }
                    let byte = self.bytes(1)[0];
                    let prefix_length = self.cb.prefix_length();
                    self.cb.write_byte(offset, byte, prefix_length);
                    self.model.overwrite(offset, byte);
                }
            }
            true
        }
    }

    fn explore(state: &State, depth: usize, trace: &mut Vec<Op>, visited: &mut usize) {
        *visited += 1;
        assert_eq!(
            state.model.first_divergence(&state.cb),
            None,
            "buffer diverged from model after {trace:?}"
        );
        if depth == DEPTH {
            return;
        }
        for op in OPS {
            let mut next = state.clone();
            if next.apply(op) {
                trace.push(op);
                explore(&next, depth + 1, trace, visited);
                trace.pop();
            }
        }
    }

    #[test]
    fn every_short_operation_sequence_stays_coherent() {
        for alloc_length in [1, 2, 4, 8] {
            let mut visited = 0;
            explore(&State::new(alloc_length), 0, &mut Vec::new(), &mut visited);
            assert!(visited > 1000, "explored only {visited} states");
        }
    }

    #[test]
    fn divergence_is_reported_at_first_bad_offset() {
        let mut cb = HeapBuffer::initialize(4, 4).unwrap();
        cb.write_buffer(&[1, 2, 3]).unwrap();
        let mut model = ReferenceModel::new();
        model.append(&[1, 9, 3]);
        assert_eq!(model.first_divergence(&cb), Some(1));

        model.drain(3);
        assert_eq!(model.first_divergence(&cb), Some(0));
    }
}
