//! # vcb — Verified Circular Buffer toolkit
//!
//! - `vcb bench` — Sequential and out-of-order reassembly throughput.
//! - `vcb verify` — Run the Kani proofs.

mod bench;
mod config;
mod report;

use std::path::PathBuf;
use std::process::{Command, ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, StoreKind};
use report::Report;

/// Auto-growing circular byte buffer for stream reassembly.
#[derive(Parser)]
#[command(name = "vcb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure write and read throughput across chunk sizes.
    Bench {
        /// TOML config; missing file means defaults.
        #[arg(long, default_value = "vcb.toml")]
        config: PathBuf,

        /// Repetitions per chunk size.
        #[arg(long)]
        iterations: Option<u32>,

        /// Backing store for the buffers under test.
        #[arg(long, value_enum)]
        store: Option<StoreKind>,

        /// Initial allocation (power of two).
        #[arg(long)]
        alloc_length: Option<usize>,

        /// Growth ceiling and stream length (power of two).
        #[arg(long)]
        virtual_length: Option<usize>,

        /// Seed for the out-of-order delivery shuffle.
        #[arg(long)]
        seed: Option<u64>,

        /// Append results as gnuplot data blocks to this file.
        #[arg(long)]
        gnuplot: Option<PathBuf>,

        /// Name of this run in gnuplot and JSON output.
        #[arg(long, default_value = "verified")]
        label: String,

        /// Print a JSON report instead of tables.
        #[arg(long)]
        json: bool,
    },

    /// Run Kani formal verification proofs.
    Verify,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vcb=info,vcb_core=warn,vcb_io=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench {
            config,
            iterations,
            store,
            alloc_length,
            virtual_length,
            seed,
            gnuplot,
            label,
            json,
        } => {
            let mut bench_config = match Config::load(&config) {
                Ok(loaded) => loaded.bench,
                Err(e) => {
                    tracing::error!("{e}");
                    return ExitCode::FAILURE;
                }
            };
            if let Some(iterations) = iterations {
                bench_config.iterations = iterations;
            }
            if let Some(store) = store {
                bench_config.store = store;
            }
            if let Some(alloc_length) = alloc_length {
                bench_config.alloc_length = alloc_length;
            }
            if let Some(virtual_length) = virtual_length {
                bench_config.virtual_length = virtual_length;
            }
            if let Some(seed) = seed {
                bench_config.seed = seed;
            }
            if let Err(e) = bench_config.validate() {
                tracing::error!("invalid bench config: {e}");
                return ExitCode::FAILURE;
            }

            tracing::info!(
                iterations = bench_config.iterations,
                store = ?bench_config.store,
                alloc_length = bench_config.alloc_length,
                virtual_length = bench_config.virtual_length,
                "starting benchmark"
            );
            let results = match bench::run(&bench_config) {
                Ok(results) => results,
                Err(e) => {
                    tracing::error!("benchmark failed: {e}");
                    return ExitCode::FAILURE;
                }
            };

            let report = Report::new(&label, &bench_config, &results);
            if json {
                match report.to_json() {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        tracing::error!("failed to encode report: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print!("{}", report.render_tables());
            }

            if let Some(path) = gnuplot {
                if let Err(e) = report.append_gnuplot(&path) {
                    tracing::error!(?path, "failed to write gnuplot data: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }

        Commands::Verify => {
            tracing::info!("running Kani proofs for vcb-verify and vcb-core");
            let mut all_passed = true;
            for package in ["vcb-verify", "vcb-core"] {
                let status = Command::new("cargo")
                    .args(["kani", "--package", package])
                    .status();
                match status {
                    Ok(status) if status.success() => {
                        tracing::info!(package, "all proofs passed");
                    }
                    Ok(status) => {
                        tracing::error!(package, %status, "proof failure");
                        all_passed = false;
                    }
                    Err(e) => {
                        tracing::error!(
                            package,
                            "kani not found ({e}); install with `cargo install kani-verifier && cargo kani setup`"
                        );
                        all_passed = false;
                    }
                }
            }

            if all_passed {
                tracing::info!("verification complete");
                ExitCode::SUCCESS
            } else {
                tracing::error!("verification incomplete: one or more proofs failed");
                ExitCode::FAILURE
            }
        }
    }
}
