//! Benchmark configuration, loaded from an optional TOML file.
//!
//! ```toml
//! [bench]
//! iterations = 200
//! chunk_sizes = [2, 4, 8, 16, 32, 64]
//! alloc_length = 4096
//! virtual_length = 65536
//! seed = 1311768467463790320
//! store = "heap"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{field} must be a power of two, got {value}")]
    NotPowerOfTwo { field: &'static str, value: usize },
    #[error("alloc_length {alloc_length} exceeds virtual_length {virtual_length}")]
    AllocAboveVirtual {
        alloc_length: usize,
        virtual_length: usize,
    },
    #[error("chunk size {chunk_size} must be between 1 and virtual_length {virtual_length}")]
    BadChunkSize {
        chunk_size: usize,
        virtual_length: usize,
    },
    #[error("iterations must be positive")]
    NoIterations,
}

/// Where buffers under test keep their bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Global heap (`Box<[u8]>`).
    #[default]
    Heap,
    /// Anonymous memory maps.
    Mmap,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub bench: BenchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BenchConfig {
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_chunk_sizes")]
    pub chunk_sizes: Vec<usize>,
    #[serde(default = "default_alloc_length")]
    pub alloc_length: usize,
    #[serde(default = "default_virtual_length")]
    pub virtual_length: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub store: StoreKind,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            chunk_sizes: default_chunk_sizes(),
            alloc_length: default_alloc_length(),
            virtual_length: default_virtual_length(),
            seed: default_seed(),
            store: StoreKind::default(),
        }
    }
}

fn default_iterations() -> u32 {
    200
}
fn default_chunk_sizes() -> Vec<usize> {
    vec![2, 4, 8, 16, 32, 64]
}
fn default_alloc_length() -> usize {
    4096
}
fn default_virtual_length() -> usize {
    65536
}
fn default_seed() -> u64 {
    0x1234_5678_9ABC_DEF0
}

impl Config {
    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(?path, "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl BenchConfig {
    /// Reject configurations the buffer would panic on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        for (field, value) in [
            ("alloc_length", self.alloc_length),
            ("virtual_length", self.virtual_length),
        ] {
            if !value.is_power_of_two() {
                return Err(ConfigError::NotPowerOfTwo { field, value });
            }
        }
        if self.alloc_length > self.virtual_length {
            return Err(ConfigError::AllocAboveVirtual {
                alloc_length: self.alloc_length,
                virtual_length: self.virtual_length,
            });
        }
        if let Some(&chunk_size) = self
            .chunk_sizes
            .iter()
            .find(|&&size| size == 0 || size > self.virtual_length)
        {
            return Err(ConfigError::BadChunkSize {
                chunk_size,
                virtual_length: self.virtual_length,
            });
        }
        Ok(())
    }
}
