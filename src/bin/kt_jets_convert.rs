//! # HDF5 → Blob Converter
//!
//! Dump a 2-D HDF5 dataset as a flat little-endian f32 blob that
//! `kt_jets --format binary` reads directly.
//!
//! ```bash
//! cargo run --release --features hdf5 --bin kt_jets_convert -- \
//!     --input events_anomalydetection.h5 --output data.bin
//! ```

use clap::Parser;
use std::path::PathBuf;

use kt_jets::hdf5_source::{convert_to_blob, DEFAULT_DATASET};

#[derive(Parser, Debug)]
#[command(name = "kt_jets_convert")]
#[command(about = "Convert an HDF5 event table into a flat f32 blob")]
#[command(version)]
struct Args {
    /// HDF5 file to read
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Dataset path inside the file
    #[arg(long, default_value = DEFAULT_DATASET)]
    dataset: String,

    /// Blob file to write
    #[arg(long, short = 'o', default_value = "data.bin")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    println!("📂 Opening {}...", args.input.display());

    let (rows, cols) = convert_to_blob(&args.input, &args.dataset, &args.output)?;

    println!(
        "✓ Saved ({}, {}) matrix to {}",
        rows,
        cols,
        args.output.display()
    );
    println!("  Run: kt_jets --input {} --cols {}", args.output.display(), cols);
    Ok(())
}
