//! # Jet Clusterer
//!
//! Sequential-recombination jet clustering of collision events.
//!
//! ## Architecture Overview
//!
//! ```text
//!                            JET CLUSTERER
//!     ┌────────────────────────────────────────────────────────────┐
//!     │   Event (leaf particles: pT, η, φ)                          │
//!     │        │                                                   │
//!     │        ▼                                                   │
//!     │   ┌──────────────────────────────────────────────────┐     │
//!     │   │              CLUSTERING ENGINE                   │     │
//!     │   │  active set ──► DistanceMetric ──► min d_iB      │     │
//!     │   │       ▲                       └──► min d_ij      │     │
//!     │   │       │                                │         │     │
//!     │   │       └──── merge (i, j) ◄── d_ij ≤ d_iB         │     │
//!     │   │             promote i  ◄──── d_iB < d_ij ──► jets│     │
//!     │   └──────────────────────────────────────────────────┘     │
//!     │        │                                                   │
//!     │        ▼                                                   │
//!     │   CONSERVATION VALIDATOR  (Σ pT, multiplicity)              │
//!     │        │                                                   │
//!     │        ▼                                                   │
//!     │   JET FILTER ──► METRICS (pT, η, φ, jets/event)             │
//!     └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kt_jets::collider::{JetClusterer, Event};
//!
//! let mut clusterer = JetClusterer::new(ClusterConfig::default());
//! let clustered = clusterer.cluster(event);
//! let emitted = clusterer.record(&clustered);
//! ```

pub mod clustering;
pub mod conservation;
pub mod distance;
pub mod metrics;
pub mod particles;

pub use clustering::{cluster_event, ClusteredEvent, EventClustering, Transition};
pub use conservation::{
    ConservationCheckResult, ConservationReport, ConservationSummary, ConservationValidator,
};
pub use distance::{CandidatePair, DistanceMetric};
pub use metrics::{Histogram, JetDistributions, MetricsReport};
pub use particles::{Event, Jet, Particle};

use crate::config::{ClusterConfig, RunConfig};
use crate::sink::JetFilter;

/// Clustering engine plus per-event validation, filtering and metrics
///
/// `cluster` takes `&self` and can run on many events concurrently;
/// `record` folds results in, one event at a time.
#[derive(Debug, Clone)]
pub struct JetClusterer {
    config: ClusterConfig,
    metric: DistanceMetric,
    filter: JetFilter,
    validator: Option<ConservationValidator>,
    conservation: ConservationSummary,
    metrics: MetricsReport,
}

impl JetClusterer {
    /// Clusterer without filtering and without validation
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            metric: DistanceMetric::new(&config),
            config,
            filter: JetFilter::default(),
            validator: None,
            conservation: ConservationSummary::default(),
            metrics: MetricsReport::new(),
        }
    }

    /// Clusterer set up from a full run configuration
    pub fn from_run_config(config: &RunConfig) -> Self {
        let mut clusterer = Self::new(config.cluster.clone())
            .with_filter(JetFilter::new(config.output.min_pt));
        if config.validate_conservation {
            clusterer = clusterer
                .with_validator(ConservationValidator::new(config.conservation_tolerance));
        }
        clusterer
    }

    pub fn with_filter(mut self, filter: JetFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_validator(mut self, validator: ConservationValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn filter(&self) -> &JetFilter {
        &self.filter
    }

    /// Cluster one event to completion
    pub fn cluster(&self, event: Event) -> ClusteredEvent {
        EventClustering::with_metric(event, self.metric.clone()).run()
    }

    /// Validate, filter and account one clustered event; returns the jets to emit
    pub fn record(&mut self, event: &ClusteredEvent) -> Vec<Jet> {
        if let Some(validator) = &self.validator {
            self.conservation.record(&validator.check_event(event));
        }

        let emitted = self.filter.apply(&event.jets);
        self.metrics.record(event, &emitted);
        emitted
    }

    pub fn conservation(&self) -> &ConservationSummary {
        &self.conservation
    }

    pub fn metrics(&self) -> &MetricsReport {
        &self.metrics
    }

    /// No checked event violated conservation
    pub fn is_healthy(&self) -> bool {
        self.conservation.all_conserved()
    }

    /// Hand back the accumulated summaries
    pub fn into_reports(self) -> (ConservationSummary, MetricsReport) {
        (self.conservation, self.metrics)
    }

    /// Reset accumulated summaries
    pub fn reset(&mut self) {
        self.conservation = ConservationSummary::default();
        self.metrics = MetricsReport::new();
    }
}

impl Default for JetClusterer {
    fn default() -> Self {
        Self::new(ClusterConfig::default())
    }
}
