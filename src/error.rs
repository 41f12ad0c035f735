// src/error.rs
//
// Recoverable errors. Caller misuse inside the numerical pipeline (mismatched
// topologies, short FFT buffers) is reported by panics instead; these types
// cover data that arrives from outside (deserialised descriptors, config,
// optional FFT backends).

use thiserror::Error;

/// Invalid topology descriptor.
#[derive(Debug, Error, PartialEq)]
pub enum TopologyError {
    #[error("topology must have at least one dimension")]
    Empty,

    #[error("descriptor arrays disagree: {counts} cell counts, {sizes} cell sizes, {origins} origins")]
    DimensionMismatch {
        counts: usize,
        sizes: usize,
        origins: usize,
    },

    #[error("cell count along axis {axis} must be positive")]
    ZeroCellCount { axis: usize },

    #[error("cell size along axis {axis} must be positive and finite (got {size})")]
    InvalidCellSize { axis: usize, size: f64 },
}

/// Invalid field payload.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("field has {got} values but its topology has {expected} cells")]
    LengthMismatch { expected: usize, got: usize },
}

/// FFT backend selection failures.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("FFT backend not available: {0}")]
    Unavailable(String),

    #[error("unknown FFT backend name: {0:?}")]
    UnknownName(String),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
