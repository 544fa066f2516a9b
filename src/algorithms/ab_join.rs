use tracing::{debug, instrument};

use crate::algorithms::common::{check_finite, sliding_dot_product, validate_k};
use crate::core::distance_metric::{checked_distance, DistanceFunction, Metric};
use crate::core::matrix_profile::{JoinAccumulator, JoinProfile, RollingStats, StatsStrategy};
use crate::core::subsequence::window;
use crate::error::{Operand, Result};
use crate::metrics::euclidean::ZNormalizedEuclidean;

/// Minimum number of subsequences before dispatching to parallel AB-join.
#[cfg(feature = "parallel")]
const MIN_PARALLEL_SUBS: usize = 256;

/// Compute the AB-join between two time series.
///
/// For each subsequence of `ts_a`, finds the nearest subsequence of `ts_b`.
/// Unlike self-join, AB-join:
/// - Traverses ALL diagonals (no exclusion zone)
/// - Produces a rectangular distance matrix (n_a × n_b)
///
/// Equal distances are broken as in the self-join: the match closest to
/// `i` wins, then the lower index in B. The built-in metric walks the diagonals
/// of the rectangular matrix with the QT recurrence; a custom metric is
/// evaluated on every `(i, j)` pair.
#[instrument(skip(ts_a, ts_b, metric), fields(n_a = ts_a.len(), n_b = ts_b.len(), m))]
pub fn ab_join(
    ts_a: &[f64],
    ts_b: &[f64],
    m: usize,
    stats: StatsStrategy,
    metric: Metric<'_>,
) -> Result<JoinProfile> {
    validate_k(m, ts_a.len(), Operand::SeriesA)?;
    validate_k(m, ts_b.len(), Operand::SeriesB)?;
    check_finite(ts_a, Operand::SeriesA)?;
    check_finite(ts_b, Operand::SeriesB)?;

    let n_a = ts_a.len() - m + 1;
    let n_b = ts_b.len() - m + 1;
    debug!(n_a, n_b, custom = metric.is_custom(), "ab-join");

    let acc = match metric {
        Metric::ZNormalized => {
            let stats_a = RollingStats::with_strategy(ts_a, m, stats)?;
            let stats_b = RollingStats::with_strategy(ts_b, m, stats)?;
            // Positive diagonals start at (0, t): dot(T_A[0..m], T_B[t..t+m])
            let qt_first_pos = sliding_dot_product(&ts_a[0..m], ts_b);
            // Negative diagonals start at (t, 0): dot(T_B[0..m], T_A[t..t+m])
            let qt_first_neg = sliding_dot_product(&ts_b[0..m], ts_a);
            let cx = JoinCtx {
                ts_a,
                ts_b,
                m,
                n_a,
                n_b,
                qt_first_pos: &qt_first_pos,
                qt_first_neg: &qt_first_neg,
                stats_a: &stats_a,
                stats_b: &stats_b,
            };
            run_join(&cx)
        }
        Metric::Custom(f) => ab_join_custom(ts_a, ts_b, m, n_a, n_b, f)?,
    };

    Ok(acc.into_join_profile(m))
}

struct JoinCtx<'a> {
    ts_a: &'a [f64],
    ts_b: &'a [f64],
    m: usize,
    n_a: usize,
    n_b: usize,
    qt_first_pos: &'a [f64],
    qt_first_neg: &'a [f64],
    stats_a: &'a RollingStats,
    stats_b: &'a RollingStats,
}

impl JoinCtx<'_> {
    /// Walk one diagonal from `(i0, j0)` to the edge of the matrix.
    #[inline]
    fn walk(&self, i0: usize, j0: usize, qt_init: f64, acc: &mut JoinAccumulator) {
        let JoinCtx {
            ts_a,
            ts_b,
            m,
            n_a,
            n_b,
            stats_a,
            stats_b,
            ..
        } = *self;
        let diag_len = (n_a - i0).min(n_b - j0);

        let mut qt = qt_init;
        let d = ZNormalizedEuclidean::qt_to_distance(qt, i0, j0, m, stats_a, stats_b);
        acc.update(i0, d, j0);

        for p in 1..diag_len {
            let i = i0 + p;
            let j = j0 + p;
            qt = qt - ts_a[i - 1] * ts_b[j - 1] + ts_a[i + m - 1] * ts_b[j + m - 1];
            let d = ZNormalizedEuclidean::qt_to_distance(qt, i, j, m, stats_a, stats_b);
            acc.update(i, d, j);
        }
    }

    fn positive(&self, start: usize, end: usize, acc: &mut JoinAccumulator) {
        for t in start..end {
            self.walk(0, t, self.qt_first_pos[t], acc);
        }
    }

    fn negative(&self, start: usize, end: usize, acc: &mut JoinAccumulator) {
        for t in start..end {
            self.walk(t, 0, self.qt_first_neg[t], acc);
        }
    }
}

fn run_join(cx: &JoinCtx<'_>) -> JoinAccumulator {
    #[cfg(feature = "parallel")]
    if cx.n_a.min(cx.n_b) >= MIN_PARALLEL_SUBS {
        return ab_join_parallel(cx);
    }

    let mut acc = JoinAccumulator::new(cx.n_a);
    cx.positive(0, cx.n_b, &mut acc);
    cx.negative(1, cx.n_a, &mut acc);
    acc
}

/// Parallel AB-join: positive and negative diagonals are chunked across
/// threads, each chunk with its own accumulator.
#[cfg(feature = "parallel")]
fn ab_join_parallel(cx: &JoinCtx<'_>) -> JoinAccumulator {
    use rayon::prelude::*;

    let n_threads = rayon::current_num_threads();
    let chunk_pos = cx.n_b.div_ceil(n_threads);
    let chunk_neg = cx.n_a.div_ceil(n_threads);

    let results: Vec<JoinAccumulator> = (0..2 * n_threads)
        .into_par_iter()
        .map(|task| {
            let mut acc = JoinAccumulator::new(cx.n_a);
            if task < n_threads {
                let start = task * chunk_pos;
                let end = (start + chunk_pos).min(cx.n_b);
                if start < end {
                    cx.positive(start, end, &mut acc);
                }
            } else {
                let start = ((task - n_threads) * chunk_neg).max(1);
                let end = ((task - n_threads + 1) * chunk_neg).min(cx.n_a);
                if start < end {
                    cx.negative(start, end, &mut acc);
                }
            }
            acc
        })
        .collect();

    let mut combined = JoinAccumulator::new(cx.n_a);
    for result in &results {
        combined.merge(result);
    }
    combined
}

/// Brute-force AB-join with a caller-supplied distance.
fn ab_join_custom(
    ts_a: &[f64],
    ts_b: &[f64],
    m: usize,
    n_a: usize,
    n_b: usize,
    f: &dyn DistanceFunction,
) -> Result<JoinAccumulator> {
    let mut acc = JoinAccumulator::new(n_a);
    for i in 0..n_a {
        let wa = window(ts_a, i, m);
        for j in 0..n_b {
            let d = checked_distance(f, wa, window(ts_b, j, m))?;
            acc.update(i, d, j);
        }
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProfileError;
    use crate::metrics::absolute::AbsoluteEuclidean;

    fn join(ts_a: &[f64], ts_b: &[f64], m: usize) -> JoinProfile {
        ab_join(ts_a, ts_b, m, StatsStrategy::Windowed, Metric::ZNormalized).unwrap()
    }

    #[test]
    fn test_ab_join_identical_series() {
        // AB-join of a series with itself finds itself at distance ≈ 0
        let ts: Vec<f64> = (0..50).map(|i| (i as f64 * 0.2).sin() + (i % 4) as f64).collect();
        let m = 8;
        let jp = join(&ts, &ts, m);

        for (i, &d) in jp.distances.iter().enumerate() {
            assert!(d < 1e-6, "d[{i}] should be ~0, got {d}");
            assert_eq!(jp.indices[i], i);
        }
    }

    #[test]
    fn test_ab_join_different_lengths() {
        let ts_a: Vec<f64> = (0..30).map(|i| (i as f64 * 0.3).sin()).collect();
        let ts_b: Vec<f64> = (0..50).map(|i| (i as f64 * 0.3).sin()).collect();
        let m = 6;

        let jp = join(&ts_a, &ts_b, m);
        assert_eq!(jp.len(), ts_a.len() - m + 1);

        // ts_b contains ts_a as a prefix
        for (i, &d) in jp.distances.iter().enumerate() {
            assert!(d < 1e-4, "d_a[{i}] should be small, got {d}");
        }
    }

    #[test]
    fn test_ab_join_matches_brute_force() {
        let ts_a: Vec<f64> = (0..40).map(|i| (i as f64 * 0.2).sin()).collect();
        let ts_b: Vec<f64> = (0..35).map(|i| (i as f64 * 0.3).cos() + 0.1 * i as f64).collect();
        let m = 8;

        let fast = join(&ts_a, &ts_b, m);
        let slow = ab_join(
            &ts_a,
            &ts_b,
            m,
            StatsStrategy::Windowed,
            Metric::Custom(&ZNormalizedEuclidean),
        )
        .unwrap();

        for i in 0..fast.len() {
            assert!(fast.distances[i].is_finite());
            assert!(
                (fast.distances[i] - slow.distances[i]).abs() < 1e-7,
                "mismatch at A[{i}]: {} vs {}",
                fast.distances[i],
                slow.distances[i]
            );
        }
    }

    #[test]
    fn test_ab_join_custom_metric() {
        let ts_a = vec![1.0, 2.0, 3.0, 2.0, 1.0, 2.0, 3.0, 2.0];
        let ts_b = vec![5.0, 6.0, 7.0, 6.0, 1.0, 2.0, 3.0, 2.0];
        let m = 4;

        let jp = ab_join(&ts_a, &ts_b, m, StatsStrategy::Windowed, Metric::Custom(&AbsoluteEuclidean))
            .unwrap();
        assert_eq!(jp.len(), 5);
        // [1,2,3,2] exists in B only at index 4 in absolute terms
        assert_eq!(jp.indices[0], 4);
        assert_eq!(jp.distances[0], 0.0);
        assert_eq!(jp.indices[4], 4);
    }

    #[test]
    fn test_ab_join_tie_goes_to_closest_index() {
        let ts_a = vec![1.0, 2.0, 3.0];
        let ts_b = vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0];
        let jp = ab_join(&ts_a, &ts_b, 2, StatsStrategy::Windowed, Metric::Custom(&AbsoluteEuclidean))
            .unwrap();
        assert_eq!(jp.indices, vec![0, 1]);

        // [1, 2] repeats at 0, 2 and 4 of B
        let ts = vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0];
        let jp = ab_join(&ts, &ts, 2, StatsStrategy::Windowed, Metric::Custom(&AbsoluteEuclidean))
            .unwrap();
        assert_eq!(jp.indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_ab_join_of_ramp_with_itself() {
        // every z-normalized window of a ramp is identical
        for n in [10, 200] {
            let ts: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let jp = ab_join(&ts, &ts, 3, StatsStrategy::Windowed, Metric::ZNormalized).unwrap();
            for (i, (&d, &j)) in jp.distances.iter().zip(&jp.indices).enumerate() {
                assert!(d < 1e-6, "n={n}: distance[{i}] = {d}");
                assert_eq!(j, i, "n={n}");
            }
        }
    }

    #[test]
    fn test_ab_join_names_offending_series() {
        let short = vec![1.0, 2.0, 3.0];
        let long: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert!(matches!(
            ab_join(&long, &short, 3, StatsStrategy::Windowed, Metric::ZNormalized),
            Err(ProfileError::SubsequenceTooLong {
                operand: Operand::SeriesB,
                ..
            })
        ));
        assert!(matches!(
            ab_join(&short, &long, 3, StatsStrategy::Windowed, Metric::ZNormalized),
            Err(ProfileError::SubsequenceTooLong {
                operand: Operand::SeriesA,
                ..
            })
        ));
    }
}
