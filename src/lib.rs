//! # kt-family Jet Clustering
//!
//! Per-event sequential-recombination jet clustering for collider data.
//! Each event's particles are repeatedly merged or promoted to jets until
//! none remain, using the kt-family distances
//!
//! ```text
//! d_ij = min(pT_i⁻², pT_j⁻²) · ΔR²_ij / R²
//! d_iB = pT_i⁻²
//! ```
//!
//! ## Features
//! - Deterministic first-minimum tie-breaking, also under the parallel pair scan
//! - Events clustered concurrently on a rayon pool, written in event order
//! - Flat f32 blob and HDF5 (feature `hdf5`) event sources
//! - Per-event conservation checks and jet distributions
//!
//! ## Architecture
//!
//! ```text
//! EventSource → decode rows → Event ──► EventClustering ──► ClusteredEvent
//!                                            │                    │
//!                                    DistanceMetric        JetFilter → CSV
//!                                   (min d_iB, min d_ij)
//! ```

// Core modules
pub mod collider;
pub mod config;
pub mod error;

// Input, output and run driver
pub mod pipeline;
pub mod sink;
pub mod source;

#[cfg(feature = "hdf5")]
pub mod hdf5_source;


pub use collider::{
    cluster_event, ClusteredEvent, ConservationSummary, ConservationValidator, DistanceMetric,
    Event, EventClustering, Jet, JetClusterer, MetricsReport, Particle, Transition,
};
pub use config::{ClusterConfig, OutputConfig, RowLayout, RunConfig};
pub use error::JetError;
pub use pipeline::{cluster_all, run, run_blob_file, run_to_csv, run_with_threads, RunSummary};
pub use sink::{CsvJetWriter, JetFilter};
pub use source::{decode_row, BinaryEventSource, EventSource, MemoryEventSource};

#[cfg(feature = "hdf5")]
pub use hdf5_source::{convert_to_blob, Hdf5EventSource};

/// Result type for clustering runs
pub type JetResult<T> = Result<T, JetError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        // Physics types
        Event,
        Jet,
        Particle,
        ClusteredEvent,
        JetClusterer,

        // Configuration
        ClusterConfig,
        RunConfig,

        // I/O
        EventSource,
        BinaryEventSource,
        MemoryEventSource,
        CsvJetWriter,
        JetFilter,

        JetError,
        JetResult,
    };
}
