//! # Event Sources
//!
//! An event source yields events one by one, in event-index order. Each event
//! arrives as a fixed-width row of 32-bit floats holding `(pT, η, φ)` triples:
//!
//! ```text
//! | pT η φ | pT η φ | ... | 0 η φ | padding ... | label |
//!                           ▲
//!                           sentinel: pT == 0 ends the particle list
//! ```
//!
//! Sources are finite and forward-only. [`EventSource::drain`] collects the
//! whole stream and stops at the first failure, so a malformed source never
//! reaches the clustering stage half-read.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use crate::collider::{Event, Particle};
use crate::config::{RowLayout, FLOATS_PER_PARTICLE};
use crate::error::JetError;
use crate::JetResult;

/// Upper bound on events preallocated by [`EventSource::drain`]
const MAX_PREALLOCATED_EVENTS: usize = 1 << 16;

/// A finite, forward-only stream of events
pub trait EventSource: Iterator<Item = JetResult<Event>> {
    /// Events this source yields in total
    fn num_events(&self) -> usize;

    /// Collect every event, stopping at the first error
    fn drain(self) -> JetResult<Vec<Event>>
    where
        Self: Sized,
    {
        let expected = self.num_events().min(MAX_PREALLOCATED_EVENTS);
        let mut events = Vec::with_capacity(expected);
        for event in self {
            events.push(event?);
        }
        Ok(events)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROW DECODING
// ═══════════════════════════════════════════════════════════════════════════════

/// Decode one row into an event
///
/// Slots are scanned while a full triple fits in `cols`; trailing columns
/// are ignored. Scanning stops at the first slot with `pT == 0`.
pub fn decode_row(row: &[f32], event_id: u64, cols: usize) -> JetResult<Event> {
    let width = cols.min(row.len());
    let mut particles = Vec::new();

    for (slot, triple) in row[..width].chunks_exact(FLOATS_PER_PARTICLE).enumerate() {
        let (pt, eta, phi) = (triple[0], triple[1], triple[2]);
        if pt == 0.0 {
            break;
        }

        let reason = if !pt.is_finite() {
            Some(format!("pT is {}", pt))
        } else if pt < 0.0 {
            Some(format!("negative pT {}", pt))
        } else if !eta.is_finite() || !phi.is_finite() {
            Some(format!("non-finite direction (eta {}, phi {})", eta, phi))
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(JetError::InvalidParticle {
                event: event_id,
                slot,
                reason,
            });
        }

        particles.push(Particle::new(
            event_id,
            f64::from(pt),
            f64::from(eta),
            f64::from(phi),
        ));
    }

    Ok(Event::new(event_id, particles))
}

// ═══════════════════════════════════════════════════════════════════════════════
// FLAT BINARY BLOB
// ═══════════════════════════════════════════════════════════════════════════════

/// Events stored as a flat little-endian f32 blob of `num_events × cols` floats
#[derive(Debug, Clone)]
pub struct BinaryEventSource {
    data: Vec<f32>,
    cols: usize,
    num_events: usize,
    next: usize,
}

impl BinaryEventSource {
    /// Read a blob file up front
    pub fn open(path: impl AsRef<Path>, layout: &RowLayout) -> JetResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            JetError::Io(std::io::Error::new(
                e.kind(),
                format!("Could not open {}: {}", path.display(), e),
            ))
        })?;
        let source = Self::from_bytes(&bytes, layout)?;
        log::info!(
            "Opened {:?}: {} events of {} columns",
            path,
            source.num_events,
            source.cols
        );
        Ok(source)
    }

    /// Interpret an in-memory blob
    ///
    /// With `layout.num_events` set, the blob must hold at least that many
    /// rows; extra bytes are ignored. Without it, the blob must be a whole
    /// number of rows.
    pub fn from_bytes(bytes: &[u8], layout: &RowLayout) -> JetResult<Self> {
        layout.validate()?;
        let row_bytes = layout.row_bytes();
        let float_size = std::mem::size_of::<f32>();

        let num_events = match layout.num_events {
            Some(n) => {
                let expected = n.checked_mul(layout.cols).ok_or_else(|| {
                    JetError::InvalidParameter(format!(
                        "{} events of {} columns overflow the addressable size",
                        n, layout.cols
                    ))
                })?;
                let got = bytes.len() / float_size;
                if got < expected {
                    return Err(JetError::ShortSource { expected, got });
                }
                n
            }
            None => {
                if bytes.len() % row_bytes != 0 {
                    return Err(JetError::RaggedSource {
                        bytes: bytes.len(),
                        row_bytes,
                    });
                }
                bytes.len() / row_bytes
            }
        };

        // Bounded by bytes.len() once the size checks above pass
        let data = bytes[..num_events * row_bytes]
            .chunks_exact(float_size)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(Self {
            data,
            cols: layout.cols,
            num_events,
            next: 0,
        })
    }
}

impl Iterator for BinaryEventSource {
    type Item = JetResult<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.num_events {
            return None;
        }
        let start = self.next * self.cols;
        let row = &self.data[start..start + self.cols];
        let event = decode_row(row, self.next as u64, self.cols);
        self.next += 1;
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.num_events - self.next;
        (remaining, Some(remaining))
    }
}

impl EventSource for BinaryEventSource {
    fn num_events(&self) -> usize {
        self.num_events
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY
// ═══════════════════════════════════════════════════════════════════════════════

/// Events held in memory, either decoded rows or ready-made events
#[derive(Debug)]
pub struct MemoryEventSource {
    events: std::vec::IntoIter<JetResult<Event>>,
    num_events: usize,
}

impl MemoryEventSource {
    /// Decode rows the same way a blob would be decoded
    pub fn from_rows(rows: &[Vec<f32>], cols: usize) -> Self {
        let events: Vec<_> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| decode_row(row, i as u64, cols))
            .collect();
        Self::new(events)
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        Self::new(events.into_iter().map(Ok).collect())
    }

    /// Seeded random events with 0 to `max_particles` particles each
    ///
    /// pT ∈ [1, 100), η ∈ [-2.5, 2.5), φ ∈ [-π, π)
    pub fn synthetic(n_events: usize, max_particles: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let events = (0..n_events)
            .map(|id| {
                let id = id as u64;
                let n = rng.gen_range(0..=max_particles);
                let particles = (0..n)
                    .map(|_| {
                        Particle::new(
                            id,
                            rng.gen_range(1.0..100.0),
                            rng.gen_range(-2.5..2.5),
                            rng.gen_range(-PI..PI),
                        )
                    })
                    .collect();
                Event::new(id, particles)
            })
            .collect();
        Self::from_events(events)
    }

    fn new(events: Vec<JetResult<Event>>) -> Self {
        let num_events = events.len();
        Self {
            events: events.into_iter(),
            num_events,
        }
    }
}

impl Iterator for MemoryEventSource {
    type Item = JetResult<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.events.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.events.size_hint()
    }
}

impl EventSource for MemoryEventSource {
    fn num_events(&self) -> usize {
        self.num_events
    }
}
