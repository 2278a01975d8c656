//! Property tests against a `VecDeque` reference model.
//!
//! The model holds the logical stream exactly; the buffer must agree with it
//! byte for byte after every operation, whatever the physical layout.

use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use proptest::prelude::*;

use crate::{BackingStore, CircularBuffer, HeapBuffer};

const VIRTUAL_LENGTH: usize = 256;

#[derive(Debug, Clone)]
enum Op {
    Write(Vec<u8>),
    Drain(usize),
    Resize(u32),
    Overwrite(usize, u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => proptest::collection::vec(any::<u8>(), 0..40).prop_map(Op::Write),
        3 => (0usize..48).prop_map(Op::Drain),
        1 => (0u32..3).prop_map(Op::Resize),
        2 => (any::<usize>(), any::<u8>()).prop_map(|(o, b)| Op::Overwrite(o, b)),
    ]
}

fn contents<S: BackingStore>(cb: &CircularBuffer<S>) -> Vec<u8> {
    let mut out = vec![0u8; cb.prefix_length()];
    cb.read_buffer(&mut out);
    out
}

/// Smallest power of two holding `needed` that is not below `alloc_length`.
fn expected_alloc_length(alloc_length: usize, needed: usize) -> usize {
    needed.next_power_of_two().max(alloc_length)
}

proptest! {
    #[test]
    fn buffer_matches_reference_model(
        alloc_shift in 0u32..5,
        ops in proptest::collection::vec(op(), 0..200),
    ) {
        let mut cb = HeapBuffer::initialize(1 << alloc_shift, VIRTUAL_LENGTH).unwrap();
        let mut model: VecDeque<u8> = VecDeque::new();

        for op in ops {
            match op {
                Op::Write(bytes) => {
                    // Flow control is the caller's job.
                    if model.len() + bytes.len() > VIRTUAL_LENGTH {
                        continue;
                    }
                    let old_alloc_length = cb.alloc_length();
                    let wrote = cb.write_buffer(&bytes).unwrap();
                    prop_assert_eq!(wrote, !bytes.is_empty());
                    model.extend(bytes.iter().copied());
                    prop_assert_eq!(
                        cb.alloc_length(),
                        expected_alloc_length(old_alloc_length, model.len())
                    );
                }
                Op::Drain(n) => {
                    let n = n.min(model.len());
                    let before = model.len();
                    cb.drain(n);
                    model.drain(..n);
                    prop_assert_eq!(cb.prefix_length(), before - n);
                }
                Op::Resize(extra) => {
                    let target = cb.alloc_length() << extra;
                    if target > VIRTUAL_LENGTH {
                        continue;
                    }
                    cb.resize(target).unwrap();
                    prop_assert_eq!(cb.view().read_start, 0);
                    prop_assert_eq!(cb.alloc_length(), target);
                }
                Op::Overwrite(offset, byte) => {
                    if model.is_empty() {
                        continue;
                    }
                    let offset = offset % model.len();
                    cb.write_byte(offset, byte, cb.prefix_length());
                    model[offset] = byte;
                }
            }

            let expected: Vec<u8> = model.iter().copied().collect();
            prop_assert_eq!(cb.prefix_length(), expected.len());
            prop_assert_eq!(contents(&cb), expected.clone());
            for (offset, &byte) in expected.iter().enumerate() {
                prop_assert_eq!(cb.read_byte(offset), byte);
            }
            let (head, tail) = cb.segments();
            prop_assert_eq!([head, tail].concat(), expected);
        }
    }

    #[test]
    fn wrapped_write_matches_linear_twin(
        alloc_shift in 2u32..6,
        fill_seed in any::<u8>(),
        drain_frac in 1usize..100,
        write_frac in 1usize..100,
    ) {
        let alloc_length = 1usize << alloc_shift;
        let virtual_length = alloc_length * 2;
        let fill: Vec<u8> = (0..alloc_length).map(|i| fill_seed.wrapping_add(i as u8)).collect();

        let mut wrapped = HeapBuffer::initialize(alloc_length, virtual_length).unwrap();
        wrapped.write_buffer(&fill).unwrap();
        let drained = (alloc_length - 1) * drain_frac / 100 + 1;
        wrapped.drain(drained);
        let read_start = wrapped.view().read_start;
        prop_assert!(read_start > 0 && read_start < alloc_length);

        // Straddle the physical end: read_start + prefix + write in
        // (alloc_length, 2 * alloc_length).
        let room = alloc_length - wrapped.prefix_length();
        let write_length = (room * write_frac / 100).max(1);
        prop_assert!(read_start + wrapped.prefix_length() + write_length > alloc_length);
        prop_assert!(read_start + wrapped.prefix_length() + write_length < 2 * alloc_length);
        let extra: Vec<u8> = (0..write_length).map(|i| !(i as u8)).collect();
        wrapped.write_buffer(&extra).unwrap();
        prop_assert_eq!(wrapped.alloc_length(), alloc_length);

        let mut linear = HeapBuffer::initialize(alloc_length, virtual_length).unwrap();
        linear.write_buffer(&fill[drained..]).unwrap();
        linear.write_buffer(&extra).unwrap();
        prop_assert_eq!(linear.view().read_start, 0);

        prop_assert_eq!(contents(&wrapped), contents(&linear));
    }

    #[test]
    fn resize_keeps_content(
        bytes in proptest::collection::vec(any::<u8>(), 1..64),
        drain in 0usize..64,
        extra in 0u32..3,
    ) {
        let mut cb = HeapBuffer::initialize(64, 256).unwrap();
        cb.write_buffer(&bytes).unwrap();
        cb.drain(drain.min(bytes.len()));
        let before = contents(&cb);

        cb.resize(64 << extra).unwrap();
        prop_assert_eq!(cb.view().read_start, 0);
        prop_assert_eq!(contents(&cb), before);
    }
}
