use crate::core::distance_metric::{DistanceError, DistanceFunction};
use crate::core::matrix_profile::{is_constant, window_moments, RollingStats};

/// Z-normalized Euclidean distance metric.
///
/// Distance formula: `d = sqrt(2 * m * (1 - r))` where
/// `r = (QT - m * mu_i * mu_j) / (m * sigma_i * sigma_j)`.
///
/// Edge cases:
/// - Both subsequences constant (sigma_i == 0 && sigma_j == 0) → d = 0
/// - One subsequence constant → d = sqrt(2*m)
/// - `r` is clamped to [-1, 1] and the radicand to >= 0, so rounding never
///   produces NaN
///
/// The profilers use the associated functions on precomputed
/// [`RollingStats`]. The [`DistanceFunction`] impl computes the same value
/// from two raw windows and can be passed as a custom distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZNormalizedEuclidean;

impl ZNormalizedEuclidean {
    /// Convert a dot product between subsequence `i` (stats `a`) and
    /// subsequence `j` (stats `b`) into a distance.
    #[inline(always)]
    pub fn qt_to_distance(
        qt: f64,
        i: usize,
        j: usize,
        m: usize,
        a: &RollingStats,
        b: &RollingStats,
    ) -> f64 {
        let m_f = m as f64;
        let msi = a.m_sigma_inv[i];
        let msj = b.m_sigma_inv[j];

        // Both constant → identical after z-normalization → distance 0
        if msi == 0.0 && msj == 0.0 {
            return 0.0;
        }
        // One constant → maximally different from any non-constant subsequence
        if msi == 0.0 || msj == 0.0 {
            return (2.0 * m_f).sqrt();
        }

        // m_sigma_inv = 1/(sqrt(m)*sigma), so msi*msj = 1/(m*sigma_i*sigma_j)
        let r = (qt - m_f * a.mean[i] * b.mean[j]) * msi * msj;
        let r_clamped = r.clamp(-1.0, 1.0);
        (2.0 * m_f * (1.0 - r_clamped)).max(0.0).sqrt()
    }

    /// Distance between `ts_a[i..i+m]` and `ts_b[j..j+m]` with a full dot product.
    pub fn distance_at(
        ts_a: &[f64],
        i: usize,
        ts_b: &[f64],
        j: usize,
        m: usize,
        a: &RollingStats,
        b: &RollingStats,
    ) -> f64 {
        let qt = dot(&ts_a[i..i + m], &ts_b[j..j + m]);
        Self::qt_to_distance(qt, i, j, m, a, b)
    }
}

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl DistanceFunction for ZNormalizedEuclidean {
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, DistanceError> {
        if a.len() != b.len() || a.is_empty() {
            return Err(DistanceError::new(format!(
                "z-normalized distance needs two windows of equal, non-zero length (got {} and {})",
                a.len(),
                b.len()
            )));
        }
        let m_f = a.len() as f64;
        let (mu_a, sigma_a) = window_moments(a);
        let (mu_b, sigma_b) = window_moments(b);
        let const_a = is_constant(mu_a, sigma_a);
        let const_b = is_constant(mu_b, sigma_b);
        if const_a && const_b {
            return Ok(0.0);
        }
        if const_a || const_b {
            return Ok((2.0 * m_f).sqrt());
        }
        let r = (dot(a, b) - m_f * mu_a * mu_b) / (m_f * sigma_a * sigma_b);
        Ok((2.0 * m_f * (1.0 - r.clamp(-1.0, 1.0))).max(0.0).sqrt())
    }
}
