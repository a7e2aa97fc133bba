//! Particle Types for Jet Clustering
//!
//! Each collision event is a list of massless momentum measurements given in
//! hadron-collider coordinates:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | pT    | Transverse momentum (≥ 0) |
//! | η     | Pseudorapidity |
//! | φ     | Azimuthal angle |
//!
//! Clustering merges particles into composite particles and finally promotes
//! them into jets. A [`Jet`] has the same shape as a [`Particle`] but is frozen
//! once it leaves the active set.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// PARTICLE
// ═══════════════════════════════════════════════════════════════════════════════

/// An active clustering candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Event this particle belongs to (carried through merges)
    pub event_id: u64,
    /// Transverse momentum
    pub pt: f64,
    /// Pseudorapidity
    pub eta: f64,
    /// Azimuthal angle
    pub phi: f64,
}

impl Particle {
    /// Create a new particle
    pub fn new(event_id: u64, pt: f64, eta: f64, phi: f64) -> Self {
        Self {
            event_id,
            pt,
            eta,
            phi,
        }
    }

    /// Squared angular separation: ΔR² = Δη² + Δφ²
    ///
    /// φ is not wrapped into (-π, π]; the difference is taken as stored.
    pub fn delta_r2(&self, other: &Self) -> f64 {
        (self.eta - other.eta).powi(2) + (self.phi - other.phi).powi(2)
    }

    /// Recombine two particles into a composite
    ///
    /// pT adds; η and φ are pT-weighted averages. The event id of `self` is kept.
    pub fn merge(&self, other: &Self) -> Self {
        debug_assert_eq!(self.event_id, other.event_id);
        let pt = self.pt + other.pt;
        Self {
            event_id: self.event_id,
            pt,
            eta: (self.pt * self.eta + other.pt * other.eta) / pt,
            phi: (self.pt * self.phi + other.pt * other.phi) / pt,
        }
    }

    /// Whether the particle may enter the distance metric
    pub fn is_well_formed(&self) -> bool {
        self.pt > 0.0 && self.pt.is_finite() && self.eta.is_finite() && self.phi.is_finite()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JET
// ═══════════════════════════════════════════════════════════════════════════════

/// A finalized cluster promoted out of the active set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jet {
    event_id: u64,
    pt: f64,
    eta: f64,
    phi: f64,
}

impl Jet {
    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    pub fn pt(&self) -> f64 {
        self.pt
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }
}

impl From<Particle> for Jet {
    fn from(p: Particle) -> Self {
        Self {
            event_id: p.event_id,
            pt: p.pt,
            eta: p.eta,
            phi: p.phi,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT
// ═══════════════════════════════════════════════════════════════════════════════

/// One collision record: an ordered list of leaf particles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub particles: Vec<Particle>,
}

impl Event {
    pub fn new(id: u64, particles: Vec<Particle>) -> Self {
        Self { id, particles }
    }

    /// Build an event from (pT, η, φ) triples
    pub fn from_triples(id: u64, triples: &[(f64, f64, f64)]) -> Self {
        let particles = triples
            .iter()
            .map(|&(pt, eta, phi)| Particle::new(id, pt, eta, phi))
            .collect();
        Self { id, particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Scalar sum of pT over all particles
    pub fn total_pt(&self) -> f64 {
        self.particles.iter().map(|p| p.pt).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_r2() {
        let a = Particle::new(0, 1.0, 0.0, 0.0);
        let b = Particle::new(0, 1.0, 0.3, 0.4);
        assert!((a.delta_r2(&b) - 0.25).abs() < 1e-12);
        assert_eq!(a.delta_r2(&b), b.delta_r2(&a));
    }

    #[test]
    fn test_merge_is_pt_weighted() {
        let a = Particle::new(7, 10.0, 0.0, 0.0);
        let b = Particle::new(7, 30.0, 1.0, -1.0);
        let c = a.merge(&b);

        assert_eq!(c.event_id, 7);
        assert_eq!(c.pt, 40.0);
        assert!((c.eta - 0.75).abs() < 1e-12);
        assert!((c.phi + 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_well_formed() {
        assert!(Particle::new(0, 1.0, 0.0, 0.0).is_well_formed());
        assert!(!Particle::new(0, 0.0, 0.0, 0.0).is_well_formed());
        assert!(!Particle::new(0, -2.0, 0.0, 0.0).is_well_formed());
        assert!(!Particle::new(0, 1.0, f64::NAN, 0.0).is_well_formed());
    }

    #[test]
    fn test_jet_from_particle() {
        let p = Particle::new(3, 5.0, 0.1, 0.2);
        let jet = Jet::from(p);
        assert_eq!(jet.event_id(), 3);
        assert_eq!(jet.pt(), 5.0);
        assert_eq!(jet.eta(), 0.1);
        assert_eq!(jet.phi(), 0.2);
    }

    #[test]
    fn test_event_from_triples() {
        let event = Event::from_triples(2, &[(1.0, 0.0, 0.0), (2.5, 0.1, 0.1)]);
        assert_eq!(event.len(), 2);
        assert!(event.particles.iter().all(|p| p.event_id == 2));
        assert_eq!(event.total_pt(), 3.5);
    }
}
