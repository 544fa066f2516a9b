//! Error types for matrix profile computation.

use std::fmt;

use thiserror::Error;

use crate::core::distance_metric::DistanceError;

/// Which input triggered a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// The single series of a self-join, row profile or extraction.
    Series,
    /// The first series of an AB-join.
    SeriesA,
    /// The second series of an AB-join.
    SeriesB,
    /// A scalar parameter (subsequence length, radius, index, window).
    Parameter,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operand::Series => "series",
            Operand::SeriesA => "series A",
            Operand::SeriesB => "series B",
            Operand::Parameter => "parameter",
        };
        f.write_str(s)
    }
}

/// Errors returned by every public operation of the crate.
///
/// All variants are total failures: no partial profile is ever returned.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("{operand} holds a non-finite value at index {index}")]
    NonFinite { operand: Operand, index: usize },

    #[error("{operand} must be uniformly spaced and filled")]
    NotUniform { operand: Operand },

    #[error("{ticks} ticks for {values} values")]
    LengthMismatch { ticks: usize, values: usize },

    #[error("subsequence length must be at least 2, got {k}")]
    SubsequenceTooShort { k: usize },

    #[error("subsequence length {k} must be lower than the length of {operand} ({n})")]
    SubsequenceTooLong { operand: Operand, k: usize, n: usize },

    #[error("exclusion radius can not be negative, got {radius}")]
    NegativeExclusionRadius { radius: i64 },

    #[error("index {index} can not start a subsequence (max {max})")]
    IndexOutOfRange { index: usize, max: usize },

    #[error("segmentation window must be at least 2, got {window}")]
    InvalidWindow { window: usize },

    #[error("neighbor index {neighbor} at position {index} is outside the profile")]
    InvalidNeighbor { index: usize, neighbor: i64 },

    #[error("series carries no neighbor indices; expected a matrix profile series")]
    MissingNeighbors,

    #[error("distance function returned an invalid value: {value}")]
    InvalidDistance { value: f64 },

    #[error(transparent)]
    Distance(#[from] DistanceError),

    #[error("{operand} has {len} samples, above the limit of {limit}")]
    SizeLimitExceeded {
        operand: Operand,
        len: usize,
        limit: usize,
    },

    #[error("invalid size limit for {key}: {value:?}")]
    InvalidLimit { key: String, value: String },

    #[error("unknown operation {0:?}")]
    UnknownOperation(String),

    #[error("operation {operation} can not handle a {request} request")]
    RequestMismatch {
        operation: &'static str,
        request: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ProfileError>;
