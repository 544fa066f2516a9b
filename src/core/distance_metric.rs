use thiserror::Error;

use crate::error::{ProfileError, Result};

/// Failure reported by a caller-supplied distance function.
#[derive(Debug, Clone, Error)]
#[error("distance function failed: {message}")]
pub struct DistanceError {
    message: String,
}

impl DistanceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Pairwise distance between two equal-length subsequences.
///
/// Implementations must be side-effect free: the profilers may evaluate any
/// pair in any order, and the same pair more than once. The result must be a
/// finite, non-negative number; anything else is rejected with
/// [`ProfileError::InvalidDistance`].
///
/// Closures of the form `Fn(&[f64], &[f64]) -> Result<f64, DistanceError>`
/// implement this trait directly.
///
/// # Examples
///
/// ```
/// use mprofile::{DistanceError, DistanceFunction};
///
/// let manhattan = |a: &[f64], b: &[f64]| -> Result<f64, DistanceError> {
///     Ok(a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum())
/// };
/// assert_eq!(manhattan.distance(&[1.0, 2.0], &[2.0, 4.0]).unwrap(), 3.0);
/// ```
pub trait DistanceFunction: Send + Sync {
    fn distance(&self, a: &[f64], b: &[f64]) -> std::result::Result<f64, DistanceError>;
}

impl<F> DistanceFunction for F
where
    F: Fn(&[f64], &[f64]) -> std::result::Result<f64, DistanceError> + Send + Sync,
{
    fn distance(&self, a: &[f64], b: &[f64]) -> std::result::Result<f64, DistanceError> {
        self(a, b)
    }
}

/// Distance selected for one profiling call.
///
/// `ZNormalized` runs on precomputed rolling statistics and the dot-product
/// recurrence. `Custom` materializes both subsequences and calls the
/// supplied function for every pair.
#[derive(Clone, Copy)]
pub enum Metric<'a> {
    ZNormalized,
    Custom(&'a dyn DistanceFunction),
}

impl<'a> Metric<'a> {
    pub fn from_option(custom: Option<&'a dyn DistanceFunction>) -> Self {
        match custom {
            Some(f) => Metric::Custom(f),
            None => Metric::ZNormalized,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Metric::Custom(_))
    }
}

impl std::fmt::Debug for Metric<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::ZNormalized => f.write_str("ZNormalized"),
            Metric::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Call a custom distance function and check its result.
#[inline]
pub(crate) fn checked_distance(f: &dyn DistanceFunction, a: &[f64], b: &[f64]) -> Result<f64> {
    let d = f.distance(a, b)?;
    if !d.is_finite() || d < 0.0 {
        return Err(ProfileError::InvalidDistance { value: d });
    }
    Ok(d)
}
