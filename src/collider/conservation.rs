//! Conservation Checks for Clustered Events
//!
//! Recombination only redistributes transverse momentum, and every iteration
//! removes exactly one particle from the active set. Both facts are checked
//! per event:
//!
//! | Law | Check |
//! |-----|-------|
//! | TransverseMomentum | Σ pT(inputs) = Σ pT(jets) within a relative tolerance |
//! | Multiplicity | jets + merges = inputs, jets ≤ inputs |

use serde::{Deserialize, Serialize};

use crate::collider::clustering::ClusteredEvent;

/// Result of one conservation check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConservationCheckResult {
    /// Name of the conservation law
    pub law_name: String,
    /// Whether the law is satisfied
    pub is_conserved: bool,
    /// Violation amount (0 if conserved)
    pub violation: f64,
    /// Tolerance used for comparison
    pub tolerance: f64,
    /// Incoming quantity
    pub incoming_value: f64,
    /// Outgoing quantity
    pub outgoing_value: f64,
    /// Additional details
    pub details: String,
}

impl ConservationCheckResult {
    /// Create a passing result
    pub fn passed(law_name: &str, incoming: f64, outgoing: f64, tolerance: f64) -> Self {
        Self {
            law_name: law_name.to_string(),
            is_conserved: true,
            violation: (incoming - outgoing).abs(),
            tolerance,
            incoming_value: incoming,
            outgoing_value: outgoing,
            details: "Conservation satisfied".to_string(),
        }
    }

    /// Create a failing result
    pub fn failed(law_name: &str, incoming: f64, outgoing: f64, tolerance: f64) -> Self {
        let violation = (incoming - outgoing).abs();
        Self {
            law_name: law_name.to_string(),
            is_conserved: false,
            violation,
            tolerance,
            incoming_value: incoming,
            outgoing_value: outgoing,
            details: format!(
                "Violation: |{:.6} - {:.6}| = {:.6e} > {:.6e}",
                incoming, outgoing, violation, tolerance
            ),
        }
    }
}

/// Conservation report for one event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConservationReport {
    pub event_id: u64,
    pub results: Vec<ConservationCheckResult>,
}

impl ConservationReport {
    pub fn all_conserved(&self) -> bool {
        self.results.iter().all(|r| r.is_conserved)
    }

    pub fn violations(&self) -> impl Iterator<Item = &ConservationCheckResult> {
        self.results.iter().filter(|r| !r.is_conserved)
    }
}

/// Per-event validator
#[derive(Debug, Clone)]
pub struct ConservationValidator {
    /// Relative tolerance on the pT sum
    pub tolerance: f64,
}

impl ConservationValidator {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Σ pT in against Σ pT out, scaled by the input sum
    pub fn check_transverse_momentum(&self, event: &ClusteredEvent) -> ConservationCheckResult {
        let incoming = event.total_input_pt;
        let outgoing = event.total_jet_pt();
        let allowed = self.tolerance * incoming.abs().max(1.0);

        if (incoming - outgoing).abs() <= allowed {
            ConservationCheckResult::passed("TransverseMomentum", incoming, outgoing, allowed)
        } else {
            ConservationCheckResult::failed("TransverseMomentum", incoming, outgoing, allowed)
        }
    }

    /// Every iteration removes exactly one particle
    pub fn check_multiplicity(&self, event: &ClusteredEvent) -> ConservationCheckResult {
        let incoming = event.input_particles as f64;
        let outgoing = (event.jets.len() + event.merges()) as f64;

        if event.jets.len() <= event.input_particles
            && event.jets.len() + event.merges() == event.input_particles
            && event.iterations() == event.input_particles
        {
            ConservationCheckResult::passed("Multiplicity", incoming, outgoing, 0.0)
        } else {
            ConservationCheckResult::failed("Multiplicity", incoming, outgoing, 0.0)
        }
    }

    pub fn check_event(&self, event: &ClusteredEvent) -> ConservationReport {
        ConservationReport {
            event_id: event.event_id,
            results: vec![
                self.check_transverse_momentum(event),
                self.check_multiplicity(event),
            ],
        }
    }
}

impl Default for ConservationValidator {
    fn default() -> Self {
        Self::new(1e-9)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RUN SUMMARY
// ═══════════════════════════════════════════════════════════════════════════════

/// Conservation results aggregated over a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConservationSummary {
    pub events_checked: usize,
    pub events_violating: usize,
    /// Largest pT mismatch seen
    pub max_pt_violation: f64,
    /// Ids of violating events
    pub violating_events: Vec<u64>,
}

impl ConservationSummary {
    pub fn record(&mut self, report: &ConservationReport) {
        self.events_checked += 1;

        for result in &report.results {
            if result.law_name == "TransverseMomentum" {
                self.max_pt_violation = self.max_pt_violation.max(result.violation);
            }
        }

        if !report.all_conserved() {
            self.events_violating += 1;
            self.violating_events.push(report.event_id);
            for violation in report.violations() {
                log::warn!(
                    "Event {}: {} not conserved. {}",
                    report.event_id,
                    violation.law_name,
                    violation.details
                );
            }
        }
    }

    pub fn all_conserved(&self) -> bool {
        self.events_violating == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "Conservation: {} ({} events checked, {} violating, max |ΔpT| = {:.3e})",
            if self.all_conserved() { "OK" } else { "VIOLATIONS" },
            self.events_checked,
            self.events_violating,
            self.max_pt_violation
        )
    }
}
