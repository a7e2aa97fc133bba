//! Jet Metrics and Distributions
//!
//! Kinematic summaries of a clustering run:
//! - jet pT, η and φ distributions
//! - jet multiplicity per event
//! - merge counts and totals

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::collider::clustering::ClusteredEvent;
use crate::collider::particles::Jet;

// ═══════════════════════════════════════════════════════════════════════════════
// HISTOGRAM
// ═══════════════════════════════════════════════════════════════════════════════

/// Histogram for tracking distributions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin edges
    pub edges: Vec<f64>,
    /// Bin counts
    pub counts: Vec<u64>,
    /// Total entries
    pub total: u64,
    /// Underflow count
    pub underflow: u64,
    /// Overflow count
    pub overflow: u64,
    /// Sum of values (for mean)
    sum: f64,
    /// Sum of squared values (for variance)
    sum_sq: f64,
}

impl Histogram {
    /// Create a histogram with uniform bins
    pub fn new(min: f64, max: f64, n_bins: usize) -> Self {
        let n_bins = n_bins.max(1);
        let step = (max - min) / n_bins as f64;
        let edges: Vec<f64> = (0..=n_bins).map(|i| min + i as f64 * step).collect();
        Self {
            edges,
            counts: vec![0; n_bins],
            total: 0,
            underflow: 0,
            overflow: 0,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Fill histogram with a value
    pub fn fill(&mut self, value: f64) {
        self.total += 1;
        self.sum += value;
        self.sum_sq += value * value;

        if value < self.edges[0] {
            self.underflow += 1;
            return;
        }
        if value >= self.edges[self.edges.len() - 1] {
            self.overflow += 1;
            return;
        }

        // Binary search for bin
        let bin = self.edges.partition_point(|&e| e <= value) - 1;
        if bin < self.counts.len() {
            self.counts[bin] += 1;
        }
    }

    /// Get mean
    pub fn mean(&self) -> f64 {
        if self.total > 0 {
            self.sum / self.total as f64
        } else {
            0.0
        }
    }

    /// Get variance
    pub fn variance(&self) -> f64 {
        if self.total > 1 {
            let mean = self.mean();
            (self.sum_sq / self.total as f64 - mean * mean).max(0.0)
        } else {
            0.0
        }
    }

    /// Get standard deviation
    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Get bin center for a given index
    pub fn bin_center(&self, bin: usize) -> f64 {
        if bin < self.counts.len() {
            (self.edges[bin] + self.edges[bin + 1]) / 2.0
        } else {
            0.0
        }
    }

    /// Combine another histogram with identical binning into this one
    pub fn merge(&mut self, other: &Self) {
        debug_assert_eq!(self.edges, other.edges);
        for (c, o) in self.counts.iter_mut().zip(&other.counts) {
            *c += o;
        }
        self.total += other.total;
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JET DISTRIBUTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Kinematic distribution tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JetDistributions {
    /// Jet transverse momentum
    pub pt: Histogram,
    /// Jet pseudorapidity
    pub eta: Histogram,
    /// Jet azimuthal angle
    pub phi: Histogram,
    /// Jets per event
    pub multiplicity: Histogram,
}

impl JetDistributions {
    pub fn new() -> Self {
        Self {
            pt: Histogram::new(0.0, 2000.0, 100),
            eta: Histogram::new(-5.0, 5.0, 50),
            phi: Histogram::new(-PI, PI, 36),
            multiplicity: Histogram::new(0.0, 700.0, 70),
        }
    }

    pub fn record_jet(&mut self, jet: &Jet) {
        self.pt.fill(jet.pt());
        self.eta.fill(jet.eta());
        self.phi.fill(jet.phi());
    }

    pub fn record_event(&mut self, jets: &[Jet]) {
        self.multiplicity.fill(jets.len() as f64);
        for jet in jets {
            self.record_jet(jet);
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.pt.merge(&other.pt);
        self.eta.merge(&other.eta);
        self.phi.merge(&other.phi);
        self.multiplicity.merge(&other.multiplicity);
    }
}

impl Default for JetDistributions {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// METRICS REPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// Totals and distributions over clustered events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsReport {
    pub events: usize,
    pub input_particles: usize,
    pub jets: usize,
    pub merges: usize,
    /// Largest event seen, in particles
    pub max_particles: usize,
    pub distributions: JetDistributions,
}

impl MetricsReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one clustered event; distributions see only the emitted jets
    pub fn record(&mut self, event: &ClusteredEvent, emitted: &[Jet]) {
        self.events += 1;
        self.input_particles += event.input_particles;
        self.jets += event.jets.len();
        self.merges += event.merges();
        self.max_particles = self.max_particles.max(event.input_particles);
        self.distributions.record_event(emitted);
    }

    pub fn mean_jets_per_event(&self) -> f64 {
        if self.events > 0 {
            self.jets as f64 / self.events as f64
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Events: {}  Particles: {} (max {}/event)  Jets: {} ({:.2}/event)  Merges: {}\n\
             Emitted jet pT: mean {:.3}, std {:.3}  η: mean {:.3}, std {:.3}",
            self.events,
            self.input_particles,
            self.max_particles,
            self.jets,
            self.mean_jets_per_event(),
            self.merges,
            self.distributions.pt.mean(),
            self.distributions.pt.std(),
            self.distributions.eta.mean(),
            self.distributions.eta.std(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::clustering::cluster_event;
    use crate::collider::particles::{Event, Particle};
    use crate::config::ClusterConfig;

    #[test]
    fn test_histogram_fill() {
        let mut h = Histogram::new(0.0, 10.0, 10);
        h.fill(-1.0);
        h.fill(0.0);
        h.fill(5.5);
        h.fill(10.0);

        assert_eq!(h.total, 4);
        assert_eq!(h.underflow, 1);
        assert_eq!(h.overflow, 1);
        assert_eq!(h.counts[0], 1);
        assert_eq!(h.counts[5], 1);
        assert!((h.bin_center(5) - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_mean_std() {
        let mut h = Histogram::new(0.0, 10.0, 10);
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            h.fill(v);
        }
        assert!((h.mean() - 5.0).abs() < 1e-12);
        assert!((h.std() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_merge() {
        let mut a = Histogram::new(0.0, 1.0, 4);
        let mut b = Histogram::new(0.0, 1.0, 4);
        a.fill(0.1);
        b.fill(0.9);
        b.fill(2.0);
        a.merge(&b);
        assert_eq!(a.total, 3);
        assert_eq!(a.counts, vec![1, 0, 0, 1]);
        assert_eq!(a.overflow, 1);
    }

    #[test]
    fn test_metrics_report() {
        let event = Event::from_triples(0, &[(10.0, 0.0, 0.0), (10.0, 0.01, 0.01), (2.0, 3.0, 1.0)]);
        let clustered = cluster_event(event, &ClusterConfig::default());

        let mut report = MetricsReport::new();
        report.record(&clustered, &clustered.jets);

        assert_eq!(report.events, 1);
        assert_eq!(report.input_particles, 3);
        assert_eq!(report.jets, 2);
        assert_eq!(report.merges, 1);
        assert_eq!(report.distributions.multiplicity.total, 1);
        assert_eq!(report.distributions.pt.total, 2);
        assert!((report.mean_jets_per_event() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_emitted_subset_feeds_distributions() {
        let jets = vec![
            Jet::from(Particle::new(0, 0.5, 0.0, 0.0)),
            Jet::from(Particle::new(0, 50.0, 1.0, 1.0)),
        ];
        let mut d = JetDistributions::new();
        d.record_event(&jets[1..]);
        assert_eq!(d.pt.total, 1);
        assert!((d.pt.mean() - 50.0).abs() < 1e-12);
    }
}
