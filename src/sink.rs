//! # Jet Output
//!
//! Clustered events are written as CSV, one row per emitted jet, events in
//! event-index order and jets in promotion order:
//!
//! ```text
//! EventID,pT,Eta,Phi
//! 0,20,0.005,0.005
//! ```
//!
//! Without event ids the header is `pT,Eta,Phi`. An optional minimum-pT
//! filter runs on every event before writing.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::collider::{ClusteredEvent, Jet};
use crate::error::JetError;
use crate::JetResult;

/// Per-event post-filter on jet pT
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JetFilter {
    /// Keep jets with pT strictly above this value
    pub min_pt: Option<f64>,
}

impl JetFilter {
    pub fn new(min_pt: Option<f64>) -> Self {
        Self { min_pt }
    }

    pub fn accepts(&self, jet: &Jet) -> bool {
        self.min_pt.map_or(true, |min| jet.pt() > min)
    }

    pub fn apply(&self, jets: &[Jet]) -> Vec<Jet> {
        jets.iter().filter(|j| self.accepts(j)).copied().collect()
    }
}

/// CSV writer for jets
pub struct CsvJetWriter<W: Write> {
    writer: W,
    track_event_ids: bool,
    rows: usize,
}

impl CsvJetWriter<BufWriter<File>> {
    /// Create the output file up front and write the header
    pub fn create(path: impl AsRef<Path>, track_event_ids: bool) -> JetResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            JetError::Io(std::io::Error::new(
                e.kind(),
                format!("Could not open {} for writing: {}", path.display(), e),
            ))
        })?;
        log::info!("Writing jets to {:?}", path);
        Self::new(BufWriter::new(file), track_event_ids)
    }
}

impl<W: Write> CsvJetWriter<W> {
    /// Wrap a writer and emit the header
    pub fn new(mut writer: W, track_event_ids: bool) -> JetResult<Self> {
        if track_event_ids {
            writeln!(writer, "EventID,pT,Eta,Phi")?;
        } else {
            writeln!(writer, "pT,Eta,Phi")?;
        }
        Ok(Self {
            writer,
            track_event_ids,
            rows: 0,
        })
    }

    /// Write a single jet row
    pub fn write_jet(&mut self, jet: &Jet) -> JetResult<()> {
        if self.track_event_ids {
            writeln!(
                self.writer,
                "{},{},{},{}",
                jet.event_id(),
                jet.pt(),
                jet.eta(),
                jet.phi()
            )?;
        } else {
            writeln!(self.writer, "{},{},{}", jet.pt(), jet.eta(), jet.phi())?;
        }
        self.rows += 1;
        Ok(())
    }

    /// Write already-filtered jets of one event; returns rows written
    pub fn write_jets(&mut self, jets: &[Jet]) -> JetResult<usize> {
        for jet in jets {
            self.write_jet(jet)?;
        }
        Ok(jets.len())
    }

    /// Filter and write one clustered event; returns rows written
    pub fn write_event(&mut self, event: &ClusteredEvent, filter: &JetFilter) -> JetResult<usize> {
        self.write_jets(&filter.apply(&event.jets))
    }

    /// Data rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> JetResult<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::{cluster_event, Event, Particle};
    use crate::config::ClusterConfig;
    use tempfile::TempDir;

    fn jet(event_id: u64, pt: f64, eta: f64, phi: f64) -> Jet {
        Jet::from(Particle::new(event_id, pt, eta, phi))
    }

    #[test]
    fn test_filter_is_strict() {
        let filter = JetFilter::new(Some(1.0));
        assert!(!filter.accepts(&jet(0, 1.0, 0.0, 0.0)));
        assert!(filter.accepts(&jet(0, 1.0000001, 0.0, 0.0)));
        assert!(JetFilter::default().accepts(&jet(0, 0.001, 0.0, 0.0)));
    }

    #[test]
    fn test_header_with_event_ids() {
        let writer = CsvJetWriter::new(Vec::new(), true).unwrap();
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(out, "EventID,pT,Eta,Phi\n");
    }

    #[test]
    fn test_rows_without_event_ids() {
        let mut writer = CsvJetWriter::new(Vec::new(), false).unwrap();
        writer.write_jet(&jet(3, 20.0, 0.5, -1.25)).unwrap();
        assert_eq!(writer.rows(), 1);
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(out, "pT,Eta,Phi\n20,0.5,-1.25\n");
    }

    #[test]
    fn test_write_event_applies_filter() {
        let event = Event::from_triples(
            2,
            &[(10.0, 0.0, 0.0), (10.0, 0.01, 0.01), (0.5, 2.0, 2.0)],
        );
        let clustered = cluster_event(event, &ClusterConfig::default());

        let mut writer = CsvJetWriter::new(Vec::new(), true).unwrap();
        let written = writer
            .write_event(&clustered, &JetFilter::new(Some(1.0)))
            .unwrap();
        assert_eq!(written, 1);

        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("2,20,"));
    }

    #[test]
    fn test_create_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jets.csv");

        let mut writer = CsvJetWriter::create(&path, true).unwrap();
        writer.write_jet(&jet(0, 5.0, 0.0, 0.0)).unwrap();
        writer.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "EventID,pT,Eta,Phi\n0,5,0,0\n");
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("jets.csv");
        assert!(matches!(
            CsvJetWriter::create(&path, true),
            Err(JetError::Io(_))
        ));
    }
}
