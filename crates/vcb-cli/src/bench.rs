//! # Bench — Sequential and Out-of-Order Reassembly Throughput
//!
//! Each iteration fills a fresh buffer with `virtual_length` bytes (rounded
//! down to whole chunks), reads the whole prefix back, drains it, and checks
//! the bytes against the expected pattern with CRC32.
//!
//! - **Sequential**: chunks arrive in order through `write_buffer`, growing
//!   the store from `alloc_length` by doubling.
//! - **Out-of-order**: chunks arrive in a seeded shuffled order. A
//!   [`Reassembly`] tracker stands in for the receive-buffer manager: it
//!   records arrivals, grows the store to cover each chunk, and tells
//!   `write_byte` how far the contiguous prefix reaches.

use std::fmt;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tabled::Tabled;

use vcb_core::{next_alloc_length, CircularBuffer, GrowableStore};
use vcb_io::MappedStore;

use crate::config::{BenchConfig, StoreKind};

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error(transparent)]
    Buffer(#[from] vcb_core::Error),
    #[error("{scenario} read back corrupted data at chunk size {chunk_size}: crc {actual:#010x}, expected {expected:#010x}")]
    Corrupted {
        scenario: Scenario,
        chunk_size: usize,
        expected: u32,
        actual: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Sequential,
    OutOfOrder,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Sequential => f.write_str("sequential"),
            Scenario::OutOfOrder => f.write_str("ooo"),
        }
    }
}

/// Throughput for one (scenario, chunk size) pair.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct Point {
    #[tabled(rename = "Chunk")]
    pub chunk_size: usize,
    #[tabled(rename = "Write MiB/s", display_with = "two_decimals")]
    pub write_mib_s: f64,
    #[tabled(rename = "Read MiB/s", display_with = "two_decimals")]
    pub read_mib_s: f64,
}

fn two_decimals(value: &f64) -> String {
    format!("{value:.2}")
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub points: Vec<Point>,
}

/// Run both scenarios over every configured chunk size.
pub fn run(config: &BenchConfig) -> Result<Vec<ScenarioResult>, BenchError> {
    match config.store {
        StoreKind::Heap => run_with::<Box<[u8]>>(config),
        StoreKind::Mmap => run_with::<MappedStore>(config),
    }
}

fn run_with<S: GrowableStore>(config: &BenchConfig) -> Result<Vec<ScenarioResult>, BenchError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut results = Vec::with_capacity(2);
    for scenario in [Scenario::Sequential, Scenario::OutOfOrder] {
        let mut points = Vec::with_capacity(config.chunk_sizes.len());
        for &chunk_size in &config.chunk_sizes {
            let point = match scenario {
                Scenario::Sequential => sequential::<S>(config, chunk_size)?,
                Scenario::OutOfOrder => out_of_order::<S>(config, chunk_size, &mut rng)?,
            };
            tracing::info!(
                %scenario,
                chunk_size,
                write_mib_s = point.write_mib_s,
                read_mib_s = point.read_mib_s,
                "bench point"
            );
            points.push(point);
        }
        results.push(ScenarioResult { scenario, points });
    }
    Ok(results)
}

/// Accumulated timings for one (scenario, chunk size) pair.
struct Timings {
    chunk_size: usize,
    bytes: u64,
    write: Duration,
    read: Duration,
}

impl Timings {
    fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            bytes: 0,
            write: Duration::ZERO,
            read: Duration::ZERO,
        }
    }

    fn into_point(self) -> Point {
        Point {
            chunk_size: self.chunk_size,
            write_mib_s: throughput_mib_s(self.bytes, self.write),
            read_mib_s: throughput_mib_s(self.bytes, self.read),
        }
    }
}

fn throughput_mib_s(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        bytes as f64 / (1024.0 * 1024.0) / secs
    } else {
        0.0
    }
}

/// Stream byte at absolute offset `offset`.
#[inline]
fn pattern_byte(offset: usize) -> u8 {
    (offset & 0xFF) as u8
}

fn fill_pattern(chunk: &mut [u8], offset: usize) {
    for (i, byte) in chunk.iter_mut().enumerate() {
        *byte = pattern_byte(offset + i);
    }
}

fn pattern_crc(len: usize) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    let mut chunk = [0u8; 256];
    fill_pattern(&mut chunk, 0);
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(chunk.len());
        hasher.update(&chunk[..n]);
        remaining -= n;
    }
    hasher.finalize()
}

/// Read the whole prefix into `out`, drain it, and return the byte count.
fn read_and_drain<S: GrowableStore>(cb: &mut CircularBuffer<S>, out: &mut [u8]) -> usize {
    let len = cb.prefix_length();
    cb.read_buffer(&mut out[..len]);
    cb.drain(len);
    len
}

fn check_crc(
    scenario: Scenario,
    chunk_size: usize,
    expected: u32,
    bytes: &[u8],
) -> Result<(), BenchError> {
    let actual = crc32fast::hash(bytes);
    if actual != expected {
        return Err(BenchError::Corrupted {
            scenario,
            chunk_size,
            expected,
            actual,
        });
    }
    Ok(())
}

fn sequential<S: GrowableStore>(
    config: &BenchConfig,
    chunk_size: usize,
) -> Result<Point, BenchError> {
    let n_chunks = config.virtual_length / chunk_size;
    let stream_length = n_chunks * chunk_size;
    let expected = pattern_crc(stream_length);
    let mut chunk = vec![0u8; chunk_size];
    let mut out = vec![0u8; stream_length];
    let mut timings = Timings::new(chunk_size);

    for _ in 0..config.iterations {
        let mut cb = CircularBuffer::<S>::initialize(config.alloc_length, config.virtual_length)?;

        let t0 = Instant::now();
        for i in 0..n_chunks {
            fill_pattern(&mut chunk, i * chunk_size);
            cb.write_buffer(&chunk)?;
        }
        let t1 = Instant::now();
        let len = read_and_drain(&mut cb, &mut out);
        let t2 = Instant::now();

        check_crc(Scenario::Sequential, chunk_size, expected, &out[..len])?;
        timings.write += t1 - t0;
        timings.read += t2 - t1;
        timings.bytes += len as u64;
        cb.uninitialize();
    }
    Ok(timings.into_point())
}

fn out_of_order<S: GrowableStore>(
    config: &BenchConfig,
    chunk_size: usize,
    rng: &mut StdRng,
) -> Result<Point, BenchError> {
    let n_chunks = config.virtual_length / chunk_size;
    let stream_length = n_chunks * chunk_size;
    let expected = pattern_crc(stream_length);
    let mut order: Vec<usize> = (0..n_chunks).collect();
    let mut chunk = vec![0u8; chunk_size];
    let mut out = vec![0u8; stream_length];
    let mut timings = Timings::new(chunk_size);

    for _ in 0..config.iterations {
        let mut cb = CircularBuffer::<S>::initialize(config.alloc_length, config.virtual_length)?;
        let mut reassembly = Reassembly::new(n_chunks, chunk_size);
        order.shuffle(rng);

        let t0 = Instant::now();
        for &index in &order {
            let offset = index * chunk_size;
            fill_pattern(&mut chunk, offset);
            reassembly.deliver(&mut cb, index, &chunk)?;
        }
        let t1 = Instant::now();
        let len = read_and_drain(&mut cb, &mut out);
        let t2 = Instant::now();

        check_crc(Scenario::OutOfOrder, chunk_size, expected, &out[..len])?;
        timings.write += t1 - t0;
        timings.read += t2 - t1;
        timings.bytes += len as u64;
        cb.uninitialize();
    }
    Ok(timings.into_point())
}

/// Chunk-granular gap tracker for a stream of fixed-size chunks.
///
/// Owns the knowledge the buffer deliberately lacks: which chunks have
/// arrived and therefore how long the contiguous prefix is.
#[derive(Debug)]
pub struct Reassembly {
    received: Vec<bool>,
    chunk_size: usize,
    /// Number of leading chunks that have all arrived.
    frontier: usize,
}

impl Reassembly {
    pub fn new(n_chunks: usize, chunk_size: usize) -> Self {
        Self {
            received: vec![false; n_chunks],
            chunk_size,
            frontier: 0,
        }
    }

    /// Contiguous prefix length in bytes.
    pub fn prefix_length(&self) -> usize {
        self.frontier * self.chunk_size
    }

    /// Record chunk `index` and return the new prefix length in bytes.
    pub fn record(&mut self, index: usize) -> usize {
        self.received[index] = true;
        while self.frontier < self.received.len() && self.received[self.frontier] {
            self.frontier += 1;
        }
        self.prefix_length()
    }

    /// Deposit chunk `index` into `cb` byte by byte, growing it first if the
    /// chunk lands past the current allocation.
    pub fn deliver<S: GrowableStore>(
        &mut self,
        cb: &mut CircularBuffer<S>,
        index: usize,
        chunk: &[u8],
    ) -> Result<(), vcb_core::Error> {
        let offset = index * self.chunk_size;
        let end = offset + chunk.len();
        if end > cb.alloc_length() {
            cb.resize(next_alloc_length(cb.alloc_length(), end))?;
        }

        let Some((&last, body)) = chunk.split_last() else {
            return Ok(());
        };
        let prefix_length = self.prefix_length();
        for (i, &byte) in body.iter().enumerate() {
            cb.write_byte(offset + i, byte, prefix_length);
        }
        let new_prefix_length = self.record(index);
        cb.write_byte(end - 1, last, new_prefix_length);
        Ok(())
    }
}
