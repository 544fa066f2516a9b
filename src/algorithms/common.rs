use realfft::RealFftPlanner;
use tracing::warn;

use crate::error::{Operand, ProfileError, Result};

/// Size threshold (n * m) above which we dispatch to the FFT path.
/// Below this, the naive O(n*m) loop wins due to lower constant overhead.
const FFT_THRESHOLD: usize = 256 * 1024;

/// Compute the sliding dot product between a query subsequence `q` and time series `ts`.
///
/// Returns a vector of length `ts.len() - q.len() + 1` where element `i` is
/// `dot(q, ts[i..i+m])`. Callers guarantee `ts.len() >= q.len()`.
///
/// Adaptively dispatches to an FFT-based O(n log n) implementation for large
/// inputs, falling back to the naive O(n*m) loop for small inputs.
pub fn sliding_dot_product(q: &[f64], ts: &[f64]) -> Vec<f64> {
    let m = q.len();
    let n = ts.len();
    debug_assert!(n >= m, "Time series shorter than query");
    if n * m > FFT_THRESHOLD {
        sliding_dot_product_fft(q, ts).unwrap_or_else(|| sliding_dot_product_naive(q, ts))
    } else {
        sliding_dot_product_naive(q, ts)
    }
}

/// Naive O(n*m) sliding dot product.
pub fn sliding_dot_product_naive(q: &[f64], ts: &[f64]) -> Vec<f64> {
    let m = q.len();
    let n_subs = ts.len() + 1 - m;

    (0..n_subs)
        .map(|i| q.iter().zip(&ts[i..i + m]).map(|(a, b)| a * b).sum())
        .collect()
}

/// FFT-based O(n log n) sliding dot product via cross-correlation.
///
/// Uses real-to-complex FFT to compute the convolution of the reversed query
/// with the time series, then extracts the dot-product values. Returns `None`
/// if the FFT backend rejects the buffers.
pub fn sliding_dot_product_fft(q: &[f64], ts: &[f64]) -> Option<Vec<f64>> {
    let m = q.len();
    let n = ts.len();
    let n_subs = n + 1 - m;
    let fft_len = (n + m - 1).next_power_of_two();

    let mut planner = RealFftPlanner::<f64>::new();
    let fft_forward = planner.plan_fft_forward(fft_len);
    let fft_inverse = planner.plan_fft_inverse(fft_len);

    // Reverse query into zero-padded buffer
    let mut q_padded = vec![0.0; fft_len];
    for (dst, &src) in q_padded.iter_mut().zip(q.iter().rev()) {
        *dst = src;
    }

    let mut ts_padded = vec![0.0; fft_len];
    ts_padded[..n].copy_from_slice(ts);

    let mut q_spectrum = fft_forward.make_output_vec();
    let mut ts_spectrum = fft_forward.make_output_vec();
    fft_forward.process(&mut q_padded, &mut q_spectrum).ok()?;
    fft_forward.process(&mut ts_padded, &mut ts_spectrum).ok()?;

    for (q_val, ts_val) in q_spectrum.iter_mut().zip(ts_spectrum.iter()) {
        *q_val *= ts_val;
    }

    let mut result = vec![0.0; fft_len];
    fft_inverse.process(&mut q_spectrum, &mut result).ok()?;

    // realfft inverse is unnormalized
    let norm = 1.0 / fft_len as f64;

    // Convolution result at indices [m-1 .. m-1+n_subs]
    Some(
        result[m - 1..m - 1 + n_subs]
            .iter()
            .map(|&x| x * norm)
            .collect(),
    )
}

/// Apply an exclusion zone around index `idx`, setting entries within the zone to infinity.
///
/// The zone covers indices `[idx - zone, idx + zone]` (clamped to bounds).
#[inline]
pub fn apply_exclusion_zone(profile: &mut [f64], idx: usize, zone: usize) {
    let start = idx.saturating_sub(zone);
    let end = idx.saturating_add(zone).saturating_add(1).min(profile.len());
    for val in &mut profile[start..end] {
        *val = f64::INFINITY;
    }
}

/// Default exclusion radius: `ceil(k / 4)`.
#[inline]
pub fn default_exclusion_radius(k: usize) -> usize {
    k.div_ceil(4)
}

/// Resolve an optional, possibly negative, caller-supplied radius.
pub(crate) fn resolve_radius(radius: Option<i64>, k: usize) -> Result<usize> {
    match radius {
        None => Ok(default_exclusion_radius(k)),
        Some(r) if r < 0 => Err(ProfileError::NegativeExclusionRadius { radius: r }),
        Some(r) => Ok(usize::try_from(r).unwrap_or(usize::MAX)),
    }
}

/// Check `2 <= k < n` for the named operand.
pub(crate) fn validate_k(k: usize, n: usize, operand: Operand) -> Result<()> {
    if k < 2 {
        return Err(ProfileError::SubsequenceTooShort { k });
    }
    if k >= n {
        return Err(ProfileError::SubsequenceTooLong { operand, k, n });
    }
    Ok(())
}

/// Reject NaN and infinite samples.
pub(crate) fn check_finite(ts: &[f64], operand: Operand) -> Result<()> {
    match ts.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ProfileError::NonFinite { operand, index }),
        None => Ok(()),
    }
}

/// Reject inputs above the resolved size limit before anything is allocated.
pub(crate) fn check_size(operand: Operand, len: usize, limit: usize) -> Result<()> {
    if len > limit {
        warn!(%operand, len, limit, "input rejected by size limit");
        return Err(ProfileError::SizeLimitExceeded {
            operand,
            len,
            limit,
        });
    }
    Ok(())
}

/// Partition diagonals `[first_diag, n_subs)` into `n_chunks` ranges of
/// approximately equal work.
///
/// Diagonal `t` has `n_subs - t` cells, so early diagonals are longer.
#[cfg(feature = "parallel")]
pub fn compute_diagonal_ranges(
    first_diag: usize,
    n_subs: usize,
    n_chunks: usize,
) -> Vec<(usize, usize)> {
    let n_diags = n_subs.saturating_sub(first_diag);
    if n_diags == 0 || n_chunks == 0 {
        return vec![];
    }
    let n_chunks = n_chunks.min(n_diags);

    // Cumulative work for the first `i` diagonals:
    //   cumwork(i) = sum_{j=0}^{i-1} (n_diags - j) = i*n_diags - i*(i-1)/2
    let cumwork = |i: usize| -> usize { i * n_diags - i * i.saturating_sub(1) / 2 };
    let total_work = cumwork(n_diags);

    let mut ranges = Vec::with_capacity(n_chunks);
    let mut prev = 0usize;

    for c in 1..=n_chunks {
        let target = if c == n_chunks {
            n_diags
        } else {
            let threshold = (c as f64 * total_work as f64 / n_chunks as f64).round() as usize;
            let mut lo = prev;
            let mut hi = n_diags;
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                if cumwork(mid) >= threshold {
                    hi = mid;
                } else {
                    lo = mid + 1;
                }
            }
            lo
        };

        if target > prev {
            ranges.push((first_diag + prev, first_diag + target));
        }
        prev = target;
    }

    ranges
}
