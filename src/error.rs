//! Crate-wide error and result types.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by network configuration, evaluation, and persistence.
///
/// Nothing here retries; every failure propagates synchronously to the
/// caller, and no operation leaves a layer's parameters half-updated.
#[derive(Error, Debug)]
pub enum Error {
    /// A vector's length disagrees with the layer it feeds.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A layer index fell outside the current topology.
    #[error("layer index {index} out of range for {count} layers")]
    LayerIndex { index: usize, count: usize },

    /// The topology was empty or contained a zero-size layer.
    #[error("bad topology: {0}")]
    BadTopology(&'static str),

    /// An operation ran before its prerequisites were configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// A backend swap was attempted after layers were built against it.
    #[error("cannot replace the {0} backend once layers are built")]
    LayersBuilt(&'static str),

    /// A persisted network failed validation against its declared topology.
    #[error("snapshot rejected: {0}")]
    Snapshot(String),

    /// An underlying file operation failed.
    #[error("io failure")]
    Io(#[from] std::io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot codec failure")]
    Codec(#[from] bincode::Error),
}
