//! HDF5 event source and blob conversion
//!
//! Reads the same row shape as the flat blob from a 2-D dataset, one
//! `1 × cols` hyperslab per event.

use hdf5::{Dataset, File};
use ndarray::s;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::collider::Event;
use crate::error::JetError;
use crate::source::{decode_row, EventSource};
use crate::JetResult;

/// Dataset holding the event table in pandas-written files
pub const DEFAULT_DATASET: &str = "df/block0_values";

fn open_dataset(path: &Path, dataset: &str) -> JetResult<(Dataset, usize, usize)> {
    let file = File::open(path)?;
    let ds = file.dataset(dataset)?;
    let shape = ds.shape();
    if shape.len() != 2 {
        return Err(JetError::Ingestion(format!(
            "dataset {} in {} has {} dimensions, expected 2",
            dataset,
            path.display(),
            shape.len()
        )));
    }
    Ok((ds, shape[0], shape[1]))
}

/// Event source over a 2-D HDF5 dataset
pub struct Hdf5EventSource {
    dataset: Dataset,
    cols: usize,
    num_events: usize,
    next: usize,
}

impl Hdf5EventSource {
    /// Open `dataset` in `path`; `num_events` defaults to every row
    pub fn open(path: impl AsRef<Path>, dataset: &str, num_events: Option<usize>) -> JetResult<Self> {
        let path = path.as_ref();
        let (ds, rows, cols) = open_dataset(path, dataset)?;

        let num_events = num_events.unwrap_or(rows);
        if num_events > rows {
            return Err(JetError::ShortSource {
                expected: num_events.saturating_mul(cols),
                got: rows * cols,
            });
        }
        if cols < crate::config::FLOATS_PER_PARTICLE {
            return Err(JetError::Ingestion(format!(
                "dataset {} has only {} columns",
                dataset, cols
            )));
        }

        log::info!(
            "Opened {:?} [{}]: {} of {} events, {} columns",
            path,
            dataset,
            num_events,
            rows,
            cols
        );
        Ok(Self {
            dataset: ds,
            cols,
            num_events,
            next: 0,
        })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn read_event(&self, index: usize) -> JetResult<Event> {
        let row = self.dataset.read_slice_1d::<f32, _>(s![index, ..])?;
        let row = row.to_vec();
        decode_row(&row, index as u64, self.cols)
    }
}

impl Iterator for Hdf5EventSource {
    type Item = JetResult<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.num_events {
            return None;
        }
        let event = self.read_event(self.next);
        self.next += 1;
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.num_events - self.next;
        (remaining, Some(remaining))
    }
}

impl EventSource for Hdf5EventSource {
    fn num_events(&self) -> usize {
        self.num_events
    }
}

/// Write a whole 2-D dataset as a row-major little-endian f32 blob
///
/// Returns the `(rows, cols)` shape written.
pub fn convert_to_blob(
    h5_path: impl AsRef<Path>,
    dataset: &str,
    out_path: impl AsRef<Path>,
) -> JetResult<(usize, usize)> {
    let h5_path = h5_path.as_ref();
    log::info!("Opening {:?}", h5_path);
    let (ds, rows, cols) = open_dataset(h5_path, dataset)?;

    let data: Vec<f32> = ds.read_raw::<f32>()?;
    if data.len() != rows * cols {
        return Err(JetError::ShortSource {
            expected: rows * cols,
            got: data.len(),
        });
    }

    let mut out = BufWriter::new(fs::File::create(out_path.as_ref())?);
    for value in &data {
        out.write_all(&value.to_le_bytes())?;
    }
    out.flush()?;

    log::info!("Saved ({}, {}) matrix to {:?}", rows, cols, out_path.as_ref());
    Ok((rows, cols))
}
