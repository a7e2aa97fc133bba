//! Error types for jet clustering runs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Event source too short: expected {expected} floats, got {got}")]
    ShortSource { expected: usize, got: usize },

    #[error("Event source of {bytes} bytes is not a whole number of {row_bytes}-byte rows")]
    RaggedSource { bytes: usize, row_bytes: usize },

    #[error("Invalid particle in event {event}, slot {slot}: {reason}")]
    InvalidParticle {
        event: u64,
        slot: usize,
        reason: String,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(String),
}

#[cfg(feature = "hdf5")]
impl From<hdf5::Error> for JetError {
    fn from(e: hdf5::Error) -> Self {
        JetError::Hdf5(e.to_string())
    }
}
