//! # kt Jet Clustering CLI
//!
//! Cluster every event of a dataset into jets and write them as CSV.
//!
//! ## Usage
//!
//! ```bash
//! # Flat f32 blob, 1000 events of 2101 columns
//! cargo run --release -- --input data.bin --events 1000
//!
//! # HDF5 dataset, jets above 1 GeV, no event ids
//! cargo run --release --features hdf5 -- --format hdf5 \
//!     --input events.h5 --events 20000 --min-pt 1.0 --no-event-ids
//!
//! # Save the resolved configuration for later runs
//! cargo run --release -- --input data.bin --write-config run.json
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use kt_jets::{run_blob_file, JetError, RunConfig, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// Flat little-endian f32 blob
    Binary,
    /// 2-D HDF5 dataset
    Hdf5,
}

#[derive(Parser, Debug)]
#[command(name = "kt_jets")]
#[command(about = "Cluster collision events into jets with the kt algorithm")]
#[command(version)]
struct Args {
    /// JSON run configuration; flags below override it
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Event data file
    #[arg(long, short = 'i', default_value = "data.bin")]
    input: PathBuf,

    /// Input format
    #[arg(long, value_enum, default_value = "binary")]
    format: InputFormat,

    /// Dataset path inside an HDF5 file
    #[arg(long, default_value = "df/block0_values")]
    dataset: String,

    /// Output CSV file
    #[arg(long, short = 'o', default_value = "ReconstructedJetDir.csv")]
    output: PathBuf,

    /// Floats per event row
    #[arg(long)]
    cols: Option<usize>,

    /// Number of events to read (default: all)
    #[arg(long, short = 'n')]
    events: Option<usize>,

    /// Jet radius R
    #[arg(long, short = 'r')]
    radius: Option<f64>,

    /// Only write jets with pT strictly above this value
    #[arg(long)]
    min_pt: Option<f64>,

    /// Omit the EventID column
    #[arg(long)]
    no_event_ids: bool,

    /// Worker threads (default: all cores)
    #[arg(long, short = 't')]
    threads: Option<usize>,

    /// Skip per-event conservation checks
    #[arg(long)]
    no_validate: bool,

    /// Write the resolved configuration to this file
    #[arg(long)]
    write_config: Option<PathBuf>,
}

impl Args {
    fn resolve_config(&self) -> Result<RunConfig, JetError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(cols) = self.cols {
            config.layout.cols = cols;
        }
        if self.events.is_some() {
            config.layout.num_events = self.events;
        }
        if let Some(radius) = self.radius {
            config.cluster.radius = radius;
        }
        if self.min_pt.is_some() {
            config.output.min_pt = self.min_pt;
        }
        if self.no_event_ids {
            config.output.track_event_ids = false;
        }
        if self.no_validate {
            config.validate_conservation = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║            kt Jet Clustering  v{:<30}║", kt_jets::VERSION);
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let config = args.resolve_config()?;
    print_config(&args, &config);

    if let Some(path) = &args.write_config {
        config.to_json_file(path)?;
        println!("💾 Configuration written to {}", path.display());
    }

    let threads = args.threads.unwrap_or_else(num_cpus);

    // Source before sink: a bad input must not truncate an existing output
    let summary = match args.format {
        InputFormat::Binary => run_blob_file(&args.input, &args.output, &config, threads)?,
        InputFormat::Hdf5 => run_hdf5(&args, &config, threads)?,
    };

    print_summary(&summary);
    println!("\n✓ Jets written to {}", args.output.display());

    if !summary.conservation.all_conserved() {
        return Err(format!(
            "{} events violated conservation",
            summary.conservation.events_violating
        )
        .into());
    }
    Ok(())
}

#[cfg(feature = "hdf5")]
fn run_hdf5(args: &Args, config: &RunConfig, threads: usize) -> Result<RunSummary, JetError> {
    let source =
        kt_jets::Hdf5EventSource::open(&args.input, &args.dataset, config.layout.num_events)?;
    let mut config = config.clone();
    config.layout.cols = source.cols();
    kt_jets::pipeline::run_to_csv(source, &args.output, &config, threads)
}

#[cfg(not(feature = "hdf5"))]
fn run_hdf5(_args: &Args, _config: &RunConfig, _threads: usize) -> Result<RunSummary, JetError> {
    Err(JetError::InvalidParameter(
        "HDF5 input requires building with --features hdf5".to_string(),
    ))
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn print_config(args: &Args, config: &RunConfig) {
    println!("📂 Input:   {} ({:?})", args.input.display(), args.format);
    if args.format == InputFormat::Hdf5 {
        println!("   Dataset: {}", args.dataset);
    }
    println!("📝 Output:  {}", args.output.display());
    println!("⚙️  Config:");
    println!("   Radius R:       {}", config.cluster.radius);
    println!("   Columns:        {}", config.layout.cols);
    match config.layout.num_events {
        Some(n) => println!("   Events:         {}", n),
        None => println!("   Events:         all"),
    }
    match config.output.min_pt {
        Some(min_pt) => println!("   Min jet pT:     {}", min_pt),
        None => println!("   Min jet pT:     none"),
    }
    println!("   Event ids:      {}", config.output.track_event_ids);
    println!("   Conservation:   {}", config.validate_conservation);
    println!();
}

fn print_summary(summary: &RunSummary) {
    println!("═══ Run Summary ═══");
    println!("{}", summary.summary());
    println!("{}", summary.metrics.summary());
}
