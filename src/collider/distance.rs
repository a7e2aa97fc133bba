//! Distance Metric
//!
//! The inverse-pT weighted angular metric of sequential recombination:
//!
//! ```text
//! d_ij = min(pT_i⁻², pT_j⁻²) · ΔR²_ij / R²
//! d_iB = pT_i⁻²
//! ```
//!
//! Small `d_ij` means two particles belong to the same jet; a small `d_iB`
//! means a particle is isolated enough to be finalized.
//!
//! Minimum selection follows a first-minimum rule: scanning in index order
//! (pairs ordered by `i`, then `j`), a later candidate replaces the current
//! one only if it is strictly smaller.

use rayon::prelude::*;

use crate::collider::particles::Particle;
use crate::config::ClusterConfig;

/// An ephemeral (distance, i, j) record; `j == None` marks a beam candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePair {
    pub dist: f64,
    pub i: usize,
    pub j: Option<usize>,
}

impl CandidatePair {
    pub fn beam(dist: f64, i: usize) -> Self {
        Self { dist, i, j: None }
    }

    pub fn pair(dist: f64, i: usize, j: usize) -> Self {
        Self { dist, i, j: Some(j) }
    }

    pub fn is_beam(&self) -> bool {
        self.j.is_none()
    }

    /// The candidate found first in scan order among equal distances wins
    fn earlier_minimum(a: Self, b: Self) -> Self {
        if b.dist < a.dist {
            b
        } else if a.dist < b.dist {
            a
        } else if (b.i, b.j) < (a.i, a.j) {
            b
        } else {
            a
        }
    }
}

/// pT⁻², asserting the particle may enter the metric
#[inline]
fn inverse_pt2(p: &Particle) -> f64 {
    assert!(
        p.pt > 0.0 && p.pt.is_finite(),
        "particle with pT = {} reached the distance metric (event {})",
        p.pt,
        p.event_id
    );
    p.pt.powi(-2)
}

/// Pairwise and beam distances for a fixed jet radius
#[derive(Debug, Clone)]
pub struct DistanceMetric {
    radius: f64,
    radius2: f64,
    parallel_threshold: usize,
}

impl DistanceMetric {
    pub fn new(config: &ClusterConfig) -> Self {
        Self {
            radius: config.radius,
            radius2: config.radius * config.radius,
            parallel_threshold: config.parallel_pair_threshold,
        }
    }

    pub fn with_radius(radius: f64) -> Self {
        Self::new(&ClusterConfig::with_radius(radius))
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// d_ij for two distinct particles of the active set
    pub fn pair_distance(&self, active: &[Particle], i: usize, j: usize) -> f64 {
        assert_ne!(i, j, "pair distance needs two distinct particles");
        let (a, b) = (&active[i], &active[j]);
        self.pair_from_inverse(inverse_pt2(a), inverse_pt2(b), a.delta_r2(b))
    }

    /// d_iB for one particle of the active set
    pub fn beam_distance(&self, active: &[Particle], i: usize) -> f64 {
        inverse_pt2(&active[i])
    }

    #[inline]
    fn pair_from_inverse(&self, inv_i: f64, inv_j: f64, delta_r2: f64) -> f64 {
        inv_i.min(inv_j) * delta_r2 / self.radius2
    }

    /// Smallest beam distance, first minimum in index order
    pub fn min_beam(&self, active: &[Particle]) -> Option<CandidatePair> {
        let mut best: Option<CandidatePair> = None;
        for i in 0..active.len() {
            let dist = self.beam_distance(active, i);
            if best.map_or(true, |b| dist < b.dist) {
                best = Some(CandidatePair::beam(dist, i));
            }
        }
        best
    }

    /// Smallest pair distance, first minimum in (i, j) scan order
    ///
    /// `None` when fewer than two particles are active. Large active sets are
    /// scanned row by row on the rayon pool; the reduction keeps the same winner.
    pub fn min_pair(&self, active: &[Particle]) -> Option<CandidatePair> {
        if active.len() < 2 {
            return None;
        }

        let inverse: Vec<f64> = active.iter().map(inverse_pt2).collect();

        if active.len() >= self.parallel_threshold {
            (0..active.len() - 1)
                .into_par_iter()
                .filter_map(|i| self.row_minimum(active, &inverse, i))
                .reduce_with(CandidatePair::earlier_minimum)
        } else {
            (0..active.len() - 1)
                .filter_map(|i| self.row_minimum(active, &inverse, i))
                .reduce(CandidatePair::earlier_minimum)
        }
    }

    /// First minimum over pairs (i, j) with j > i
    fn row_minimum(&self, active: &[Particle], inverse: &[f64], i: usize) -> Option<CandidatePair> {
        let mut best: Option<CandidatePair> = None;
        for j in (i + 1)..active.len() {
            let dist =
                self.pair_from_inverse(inverse[i], inverse[j], active[i].delta_r2(&active[j]));
            if best.map_or(true, |b| dist < b.dist) {
                best = Some(CandidatePair::pair(dist, i, j));
            }
        }
        best
    }
}

impl Default for DistanceMetric {
    fn default() -> Self {
        Self::new(&ClusterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particles(triples: &[(f64, f64, f64)]) -> Vec<Particle> {
        triples
            .iter()
            .map(|&(pt, eta, phi)| Particle::new(0, pt, eta, phi))
            .collect()
    }

    #[test]
    fn test_beam_distance_is_inverse_pt_squared() {
        let metric = DistanceMetric::default();
        let active = particles(&[(10.0, 0.0, 0.0), (0.5, 1.0, 1.0)]);
        assert!((metric.beam_distance(&active, 0) - 0.01).abs() < 1e-15);
        assert!((metric.beam_distance(&active, 1) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_pair_distance_formula() {
        let metric = DistanceMetric::with_radius(0.4);
        let active = particles(&[(10.0, 0.0, 0.0), (10.0, 0.01, 0.01)]);
        let expected = 0.01 * 0.0002 / 0.16;
        let d = metric.pair_distance(&active, 0, 1);
        assert!((d - expected).abs() < 1e-15);
        assert_eq!(d, metric.pair_distance(&active, 1, 0));
    }

    #[test]
    fn test_pair_distance_uses_harder_particle() {
        // min(pT⁻²) is set by the larger pT
        let metric = DistanceMetric::with_radius(1.0);
        let active = particles(&[(2.0, 0.0, 0.0), (4.0, 1.0, 0.0)]);
        assert!((metric.pair_distance(&active, 0, 1) - 1.0 / 16.0).abs() < 1e-15);
    }

    #[test]
    fn test_min_beam_first_minimum() {
        let metric = DistanceMetric::default();
        let active = particles(&[(1.0, 0.0, 0.0), (5.0, 0.0, 0.0), (5.0, 1.0, 1.0)]);
        let best = metric.min_beam(&active).unwrap();
        assert!(best.is_beam());
        assert_eq!(best.i, 1);
    }

    #[test]
    fn test_min_pair_first_minimum() {
        let metric = DistanceMetric::default();
        // (0,1) and (2,3) are equally close; (0,1) is found first
        let active = particles(&[
            (1.0, 0.0, 0.0),
            (1.0, 0.5, 0.0),
            (1.0, 2.0, 0.0),
            (1.0, 2.5, 0.0),
        ]);
        let best = metric.min_pair(&active).unwrap();
        assert_eq!((best.i, best.j), (0, Some(1)));
    }

    #[test]
    fn test_min_pair_absent_for_single_particle() {
        let metric = DistanceMetric::default();
        assert!(metric.min_pair(&particles(&[(3.0, 0.0, 0.0)])).is_none());
        assert!(metric.min_pair(&[]).is_none());
        assert!(metric.min_beam(&[]).is_none());
    }

    #[test]
    fn test_parallel_scan_matches_sequential() {
        // Grid of equal-pT particles on exact binary spacing: many exact ties
        let mut triples = Vec::new();
        for a in 0..12 {
            for b in 0..12 {
                triples.push((2.0, a as f64 * 0.25, b as f64 * 0.25));
            }
        }
        let active = particles(&triples);

        let sequential = DistanceMetric::new(&ClusterConfig::default().sequential());
        let parallel = DistanceMetric::new(&ClusterConfig {
            parallel_pair_threshold: 2,
            ..Default::default()
        });

        assert_eq!(sequential.min_pair(&active), parallel.min_pair(&active));
        let best = sequential.min_pair(&active).unwrap();
        assert_eq!((best.i, best.j), (0, Some(1)));
    }

    #[test]
    #[should_panic(expected = "reached the distance metric")]
    fn test_zero_pt_fails_loudly() {
        let metric = DistanceMetric::default();
        let active = particles(&[(0.0, 0.0, 0.0)]);
        metric.beam_distance(&active, 0);
    }
}
