use crate::core::distance_metric::{DistanceError, DistanceFunction};

/// Non-normalized (absolute) Euclidean distance.
///
/// Unlike `ZNormalizedEuclidean`, this metric does NOT z-normalize subsequences.
/// It computes raw Euclidean distances, making it suitable for time series where
/// amplitude matters (e.g., sensor data with meaningful absolute values).
///
/// Passed to the profilers as a custom distance, so every pair is evaluated
/// on the materialized windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsoluteEuclidean;

impl DistanceFunction for AbsoluteEuclidean {
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, DistanceError> {
        if a.len() != b.len() {
            return Err(DistanceError::new(format!(
                "windows differ in length ({} and {})",
                a.len(),
                b.len()
            )));
        }
        let sq_sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
        Ok(sq_sum.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_identical() {
        let d = AbsoluteEuclidean.distance(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_absolute_known_value() {
        // [0,0] vs [3,4] → 5
        let d = AbsoluteEuclidean.distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_absolute_is_scale_sensitive() {
        // Same shape, different offset: z-normalized would say 0
        let d = AbsoluteEuclidean.distance(&[1.0, 2.0, 3.0], &[11.0, 12.0, 13.0]).unwrap();
        assert!((d - 300.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_absolute_rejects_length_mismatch() {
        assert!(AbsoluteEuclidean.distance(&[1.0], &[1.0, 2.0]).is_err());
    }
}
