//! # Run Configuration
//!
//! Every knob of a clustering run lives here instead of being compiled in:
//! the jet radius, the shape of the event rows, and how results are emitted.
//!
//! ## File Format
//!
//! Configurations serialise to JSON:
//!
//! ```json
//! {
//!   "cluster": { "radius": 0.4, "parallel_pair_threshold": 512 },
//!   "layout": { "cols": 2101, "num_events": 1000 },
//!   "output": { "track_event_ids": true, "min_pt": null },
//!   "validate_conservation": true,
//!   "conservation_tolerance": 1e-9
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::JetError;
use crate::JetResult;

/// Number of floats per particle slot: (pT, eta, phi)
pub const FLOATS_PER_PARTICLE: usize = 3;

// ═══════════════════════════════════════════════════════════════════════════════
// CLUSTERING
// ═══════════════════════════════════════════════════════════════════════════════

/// Parameters of the clustering engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Jet radius R in the pair distance
    pub radius: f64,
    /// Active-set size from which the pair scan runs on the rayon pool
    pub parallel_pair_threshold: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius: 0.4,
            parallel_pair_threshold: 512,
        }
    }
}

impl ClusterConfig {
    /// Create a config with the given radius
    pub fn with_radius(radius: f64) -> Self {
        Self {
            radius,
            ..Default::default()
        }
    }

    /// Never use the parallel pair scan
    pub fn sequential(mut self) -> Self {
        self.parallel_pair_threshold = usize::MAX;
        self
    }

    pub fn validate(&self) -> JetResult<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(JetError::InvalidParameter(format!(
                "jet radius must be positive and finite, got {}",
                self.radius
            )));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROW LAYOUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Shape of the event rows handed over by an event source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowLayout {
    /// Floats per row
    pub cols: usize,
    /// Events to read; `None` reads every row the source holds
    pub num_events: Option<usize>,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self {
            cols: 2101,
            num_events: None,
        }
    }
}

impl RowLayout {
    pub fn new(cols: usize, num_events: Option<usize>) -> Self {
        Self { cols, num_events }
    }

    /// Maximum number of particles one row can hold
    pub fn particles_per_row(&self) -> usize {
        self.cols / FLOATS_PER_PARTICLE
    }

    /// Size of one row in bytes when stored as 32-bit floats
    pub fn row_bytes(&self) -> usize {
        self.cols * std::mem::size_of::<f32>()
    }

    pub fn validate(&self) -> JetResult<()> {
        if self.cols < FLOATS_PER_PARTICLE {
            return Err(JetError::InvalidParameter(format!(
                "rows need at least {} columns, got {}",
                FLOATS_PER_PARTICLE, self.cols
            )));
        }
        if self.cols.checked_mul(std::mem::size_of::<f32>()).is_none() {
            return Err(JetError::InvalidParameter(format!(
                "{} columns overflow the row size",
                self.cols
            )));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

/// How produced jets are emitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Emit the `EventID` column
    pub track_event_ids: bool,
    /// Only emit jets with pT strictly above this value
    pub min_pt: Option<f64>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            track_event_ids: true,
            min_pt: None,
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> JetResult<()> {
        if let Some(min_pt) = self.min_pt {
            if !min_pt.is_finite() || min_pt < 0.0 {
                return Err(JetError::InvalidParameter(format!(
                    "minimum jet pT must be a non-negative number, got {}",
                    min_pt
                )));
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RUN
// ═══════════════════════════════════════════════════════════════════════════════

/// Complete configuration of a clustering run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub cluster: ClusterConfig,
    pub layout: RowLayout,
    pub output: OutputConfig,
    /// Check pT conservation and multiplicity for every event
    pub validate_conservation: bool,
    /// Relative tolerance of the pT conservation check
    pub conservation_tolerance: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            layout: RowLayout::default(),
            output: OutputConfig::default(),
            validate_conservation: true,
            conservation_tolerance: 1e-9,
        }
    }
}

impl RunConfig {
    /// Flat binary blob of 1000 events, event ids tracked
    pub fn reference_blob() -> Self {
        Self {
            layout: RowLayout::new(2101, Some(1000)),
            ..Default::default()
        }
    }

    /// Columnar dataset of 20000 events, no event ids, jets above 1 GeV
    pub fn reference_hdf5() -> Self {
        Self {
            layout: RowLayout::new(2101, Some(20000)),
            output: OutputConfig {
                track_event_ids: false,
                min_pt: Some(1.0),
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> JetResult<()> {
        self.cluster.validate()?;
        self.layout.validate()?;
        self.output.validate()?;
        if !self.conservation_tolerance.is_finite() || self.conservation_tolerance < 0.0 {
            return Err(JetError::InvalidParameter(format!(
                "conservation tolerance must be a non-negative number, got {}",
                self.conservation_tolerance
            )));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> JetResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| JetError::Ingestion(format!("Failed to read config: {}", e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| JetError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as pretty JSON
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> JetResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| JetError::Serialization(e.to_string()))?;
        fs::write(path.as_ref(), json)?;
        log::info!("Saved run configuration to {:?}", path.as_ref());
        Ok(())
    }
}
