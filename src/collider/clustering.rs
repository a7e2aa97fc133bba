//! Clustering Engine
//!
//! Per-event sequential recombination. Each iteration over the active set:
//!
//! ```text
//!   min d_iB ──┐
//!              ├──► d_iB < d_ij ? ──yes──► promote i to a jet
//!   min d_ij ──┘          │
//!                         no (ties included)
//!                         ▼
//!                 merge i, j into one composite
//! ```
//!
//! The active set loses exactly one particle per iteration, so an event with
//! `k` particles finishes after exactly `k` iterations.
//!
//! Runs keep merge and iteration counts only. The full transition history is
//! recorded when asked for with [`EventClustering::with_history`].
//!
//! ## Active set ordering
//!
//! The active set is a contiguous vector. A promotion removes its index and
//! shifts the tail down; a merge removes the higher index, then the lower one,
//! and appends the composite at the end. Because minimum selection keeps the
//! first candidate in scan order, this ordering is part of the result.

use serde::{Deserialize, Serialize};

use crate::collider::distance::{CandidatePair, DistanceMetric};
use crate::collider::particles::{Event, Jet, Particle};
use crate::config::ClusterConfig;

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSITIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// One iteration of the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Transition {
    /// The particle at `index` left the active set as a jet
    Promotion { index: usize, jet: Jet },
    /// Particles `i < j` were replaced by `composite`
    Merge {
        i: usize,
        j: usize,
        composite: Particle,
    },
}

impl Transition {
    pub fn is_merge(&self) -> bool {
        matches!(self, Transition::Merge { .. })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLUSTERED EVENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of clustering one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredEvent {
    pub event_id: u64,
    /// Number of leaf particles the event started with
    pub input_particles: usize,
    /// Scalar pT sum of the leaf particles
    pub total_input_pt: f64,
    /// Jets in promotion order
    pub jets: Vec<Jet>,
    /// Every transition, in order; empty unless the run recorded history
    pub history: Vec<Transition>,
    merges: usize,
    iterations: usize,
}

impl ClusteredEvent {
    pub fn merges(&self) -> usize {
        self.merges
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn total_jet_pt(&self) -> f64 {
        self.jets.iter().map(|j| j.pt()).sum()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT CLUSTERING STATE MACHINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Clustering run over a single event
///
/// Active while particles remain, Done once the active set is empty.
#[derive(Debug, Clone)]
pub struct EventClustering {
    event_id: u64,
    metric: DistanceMetric,
    active: Vec<Particle>,
    jets: Vec<Jet>,
    history: Option<Vec<Transition>>,
    merges: usize,
    iterations: usize,
    input_particles: usize,
    total_input_pt: f64,
}

impl EventClustering {
    /// Start clustering an event
    pub fn new(event: Event, config: &ClusterConfig) -> Self {
        Self::with_metric(event, DistanceMetric::new(config))
    }

    pub fn with_metric(event: Event, metric: DistanceMetric) -> Self {
        let input_particles = event.len();
        let total_input_pt = event.total_pt();
        Self {
            event_id: event.id,
            metric,
            active: event.particles,
            jets: Vec::with_capacity(input_particles),
            history: None,
            merges: 0,
            iterations: 0,
            input_particles,
            total_input_pt,
        }
    }

    /// Record every transition into [`ClusteredEvent::history`]
    pub fn with_history(mut self) -> Self {
        self.history = Some(Vec::with_capacity(self.input_particles));
        self
    }

    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    pub fn is_done(&self) -> bool {
        self.active.is_empty()
    }

    /// Current active set
    pub fn active(&self) -> &[Particle] {
        &self.active
    }

    /// Jets promoted so far
    pub fn jets(&self) -> &[Jet] {
        &self.jets
    }

    /// Perform one iteration; `None` once the event is done
    pub fn step(&mut self) -> Option<Transition> {
        let beam = self.metric.min_beam(&self.active)?;
        let pair = self.metric.min_pair(&self.active);

        // Promotion needs d_iB strictly below d_ij; ties merge
        let transition = match pair {
            Some(CandidatePair {
                dist,
                i,
                j: Some(j),
            }) if dist <= beam.dist => self.merge(i, j),
            _ => self.promote(beam.i),
        };

        log::trace!("event {}: {:?}", self.event_id, transition);
        self.iterations += 1;
        if transition.is_merge() {
            self.merges += 1;
        }
        if let Some(history) = &mut self.history {
            history.push(transition);
        }
        Some(transition)
    }

    fn promote(&mut self, index: usize) -> Transition {
        let jet = Jet::from(self.active.remove(index));
        self.jets.push(jet);
        Transition::Promotion { index, jet }
    }

    fn merge(&mut self, i: usize, j: usize) -> Transition {
        let (first, second) = (i.min(j), i.max(j));
        let composite = self.active[first].merge(&self.active[second]);

        self.active.remove(second);
        self.active.remove(first);
        self.active.push(composite);

        Transition::Merge {
            i: first,
            j: second,
            composite,
        }
    }

    /// Run to completion
    pub fn run(mut self) -> ClusteredEvent {
        while self.step().is_some() {}

        ClusteredEvent {
            event_id: self.event_id,
            input_particles: self.input_particles,
            total_input_pt: self.total_input_pt,
            jets: self.jets,
            history: self.history.unwrap_or_default(),
            merges: self.merges,
            iterations: self.iterations,
        }
    }
}

/// Cluster one event to completion
pub fn cluster_event(event: Event, config: &ClusterConfig) -> ClusteredEvent {
    EventClustering::new(event, config).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_empty_event_produces_no_jets() {
        let result = cluster_event(Event::new(0, Vec::new()), &ClusterConfig::default());
        assert!(result.jets.is_empty());
        assert_eq!(result.iterations(), 0);
    }

    #[test]
    fn test_single_particle_is_promoted() {
        let event = Event::from_triples(4, &[(5.0, 0.0, 0.0)]);
        let result = cluster_event(event, &ClusterConfig::default());

        assert_eq!(result.jets.len(), 1);
        assert_eq!(result.merges(), 0);
        let jet = result.jets[0];
        assert_eq!(jet.event_id(), 4);
        assert_eq!(jet.pt(), 5.0);
        assert_eq!(jet.eta(), 0.0);
        assert_eq!(jet.phi(), 0.0);
    }

    #[test]
    fn test_close_equal_pt_particles_merge() {
        let event = Event::from_triples(0, &[(10.0, 0.0, 0.0), (10.0, 0.01, 0.01)]);
        let result = cluster_event(event, &ClusterConfig::with_radius(0.4));

        assert_eq!(result.merges(), 1);
        assert_eq!(result.jets.len(), 1);
        let jet = result.jets[0];
        assert_eq!(jet.pt(), 20.0);
        assert!(approx_eq(jet.eta(), 0.005));
        assert!(approx_eq(jet.phi(), 0.005));
    }

    #[test]
    fn test_exact_tie_merges() {
        // d_iB = 1 and d_ij = 1 · R² / R² = 1
        let event = Event::from_triples(0, &[(1.0, 0.0, 0.0), (1.0, 0.4, 0.0)]);
        let mut clustering = EventClustering::new(event, &ClusterConfig::with_radius(0.4));

        let metric = DistanceMetric::with_radius(0.4);
        assert_eq!(
            metric.min_beam(clustering.active()).unwrap().dist,
            metric.min_pair(clustering.active()).unwrap().dist
        );

        let first = clustering.step().unwrap();
        assert!(first.is_merge());
        let result = clustering.run();
        assert_eq!(result.jets.len(), 1);
        assert_eq!(result.jets[0].pt(), 2.0);
    }

    #[test]
    fn test_just_outside_radius_promotes() {
        let event = Event::from_triples(0, &[(1.0, 0.0, 0.0), (1.0, 0.41, 0.0)]);
        let result = cluster_event(event, &ClusterConfig::with_radius(0.4));

        assert_eq!(result.merges(), 0);
        assert_eq!(result.jets.len(), 2);
        // Equal beam distances: the first particle goes first
        assert_eq!(result.jets[0].eta(), 0.0);
        assert_eq!(result.jets[1].eta(), 0.41);
    }

    #[test]
    fn test_merge_appends_composite_at_end() {
        let event = Event::from_triples(
            0,
            &[(10.0, 0.0, 0.0), (10.0, 0.01, 0.01), (1.0, 3.0, 3.0)],
        );
        let mut clustering = EventClustering::new(event, &ClusterConfig::default());

        let transition = clustering.step().unwrap();
        assert!(matches!(transition, Transition::Merge { i: 0, j: 1, .. }));
        assert_eq!(clustering.active().len(), 2);
        assert_eq!(clustering.active()[0].pt, 1.0);
        assert_eq!(clustering.active()[1].pt, 20.0);
    }

    #[test]
    fn test_promotion_shifts_tail() {
        let event = Event::from_triples(0, &[(1.0, 0.0, 0.0), (50.0, 2.0, 2.0), (1.0, -2.0, -2.0)]);
        let mut clustering = EventClustering::new(event, &ClusterConfig::default());

        let transition = clustering.step().unwrap();
        assert!(matches!(transition, Transition::Promotion { index: 1, .. }));
        assert_eq!(clustering.jets()[0].pt(), 50.0);
        assert_eq!(clustering.active()[0].eta, 0.0);
        assert_eq!(clustering.active()[1].eta, -2.0);
    }

    #[test]
    fn test_active_set_shrinks_by_one_per_step() {
        let event = Event::from_triples(
            0,
            &[
                (12.0, 0.1, 0.2),
                (3.0, 0.15, 0.25),
                (40.0, -1.0, 2.0),
                (2.0, -1.1, 2.1),
                (7.0, 1.5, -0.5),
            ],
        );
        let mut clustering = EventClustering::new(event, &ClusterConfig::default());

        let mut previous = clustering.active().len();
        let mut steps = 0;
        while clustering.step().is_some() {
            assert_eq!(clustering.active().len(), previous - 1);
            previous = clustering.active().len();
            steps += 1;
        }

        assert!(clustering.is_done());
        assert_eq!(steps, 5);
        assert!(clustering.step().is_none());
    }

    #[test]
    fn test_counts_without_history() {
        let event = Event::from_triples(
            0,
            &[(10.0, 0.0, 0.0), (10.0, 0.01, 0.01), (1.0, 3.0, 3.0)],
        );
        let result = cluster_event(event, &ClusterConfig::default());

        assert!(result.history.is_empty());
        assert_eq!(result.merges(), 1);
        assert_eq!(result.iterations(), 3);
        assert_eq!(result.jets.len(), 2);
    }

    #[test]
    fn test_history_recorded_on_request() {
        let event = Event::from_triples(
            0,
            &[(10.0, 0.0, 0.0), (10.0, 0.01, 0.01), (1.0, 3.0, 3.0)],
        );
        let plain = cluster_event(event.clone(), &ClusterConfig::default());
        let traced = EventClustering::new(event, &ClusterConfig::default())
            .with_history()
            .run();

        assert_eq!(traced.history.len(), 3);
        assert!(traced.history[0].is_merge());
        assert_eq!(traced.history.iter().filter(|t| t.is_merge()).count(), traced.merges());
        assert_eq!(traced.jets, plain.jets);
        assert_eq!(traced.merges(), plain.merges());
    }

    #[test]
    fn test_pt_is_conserved() {
        let event = Event::from_triples(
            9,
            &[
                (12.0, 0.1, 0.2),
                (3.0, 0.15, 0.25),
                (40.0, -1.0, 2.0),
                (2.0, -1.1, 2.1),
                (7.0, 1.5, -0.5),
                (0.5, 1.45, -0.45),
            ],
        );
        let result = cluster_event(event, &ClusterConfig::default());

        assert!((result.total_jet_pt() - result.total_input_pt).abs() < 1e-9);
        assert_eq!(result.jets.len() + result.merges(), result.input_particles);
        assert_eq!(result.iterations(), 6);
        assert!(result.jets.iter().all(|j| j.event_id() == 9));
    }
}
