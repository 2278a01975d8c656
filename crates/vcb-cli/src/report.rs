//! Bench output: terminal tables, JSON, and gnuplot data blocks.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::settings::Style;
use tabled::Table;

use crate::bench::ScenarioResult;
use crate::config::{BenchConfig, StoreKind};

/// Everything one `vcb bench` run produced.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub label: &'a str,
    pub generated_at: DateTime<Utc>,
    pub iterations: u32,
    pub alloc_length: usize,
    pub virtual_length: usize,
    pub store: StoreKind,
    pub scenarios: &'a [ScenarioResult],
}

impl<'a> Report<'a> {
    pub fn new(label: &'a str, config: &BenchConfig, scenarios: &'a [ScenarioResult]) -> Self {
        Self {
            label,
            generated_at: Utc::now(),
            iterations: config.iterations,
            alloc_length: config.alloc_length,
            virtual_length: config.virtual_length,
            store: config.store,
            scenarios,
        }
    }

    /// Human-readable tables, one per scenario.
    pub fn render_tables(&self) -> String {
        let mut out = format!(
            "CircularBuffer benchmark ({}, {} iterations, {:?} store, {} -> {} bytes)\n",
            self.label, self.iterations, self.store, self.alloc_length, self.virtual_length
        );
        for result in self.scenarios {
            let mut table = Table::new(&result.points);
            table.with(Style::rounded());
            out.push_str(&format!("\n{}\n{table}\n", result.scenario));
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Append one data block per scenario to `path`.
    ///
    /// Columns are `chunk_size  write_mib_s  read_mib_s`. A header is written
    /// when the file is new or empty; later runs are separated by two blank
    /// lines so gnuplot can address each block with `index`.
    pub fn append_gnuplot(&self, path: &Path) -> io::Result<()> {
        let has_data = path.metadata().map(|m| m.len() > 0).unwrap_or(false);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        if has_data {
            writeln!(file, "\n")?;
        } else {
            writeln!(file, "# Columns: ChunkSize  WriteMiBps  ReadMiBps")?;
            writeln!(file, "# One block per (label, scenario), in run order")?;
            writeln!(file)?;
        }

        for (i, result) in self.scenarios.iter().enumerate() {
            if i > 0 {
                writeln!(file, "\n")?;
            }
            writeln!(file, "# {} {}", self.label, result.scenario)?;
            for point in &result.points {
                writeln!(
                    file,
                    "{}\t{:.2}\t{:.2}",
                    point.chunk_size, point.write_mib_s, point.read_mib_s
                )?;
            }
        }
        tracing::info!(?path, label = self.label, "gnuplot data written");
        Ok(())
    }
}
