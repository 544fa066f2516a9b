use tracing::{debug, instrument};

use crate::algorithms::common::{
    check_finite, default_exclusion_radius, sliding_dot_product, validate_k,
};
use crate::core::distance_metric::{checked_distance, DistanceFunction, Metric};
use crate::core::matrix_profile::{
    MatrixProfile, ProfileAccumulator, RollingStats, StatsStrategy,
};
use crate::core::subsequence::window;
use crate::error::{Operand, Result};
use crate::metrics::euclidean::ZNormalizedEuclidean;

/// Minimum number of subsequences before dispatching to parallel STOMP.
/// Below this threshold, thread-dispatch overhead exceeds parallelism gains.
#[cfg(feature = "parallel")]
const MIN_PARALLEL_SUBS: usize = 256;

/// Parameters of a self-join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixProfileConfig {
    /// Subsequence length `k`.
    pub m: usize,
    /// Pairs with `|i - j| < exclusion_radius` are trivial matches.
    pub exclusion_radius: usize,
    /// Also keep the second-nearest neighbor of every subsequence.
    pub robust: bool,
    pub stats: StatsStrategy,
}

impl MatrixProfileConfig {
    /// Config with the default exclusion radius `ceil(m / 4)`.
    pub fn new(m: usize) -> Self {
        Self {
            m,
            exclusion_radius: default_exclusion_radius(m),
            robust: false,
            stats: StatsStrategy::default(),
        }
    }

    pub fn with_exclusion_radius(mut self, r: usize) -> Self {
        self.exclusion_radius = r;
        self
    }

    pub fn with_robust(mut self, robust: bool) -> Self {
        self.robust = robust;
        self
    }

    pub fn with_stats(mut self, stats: StatsStrategy) -> Self {
        self.stats = stats;
        self
    }
}

/// Compute the self-join matrix profile using the STOMP algorithm.
///
/// STOMP exploits the relationship between consecutive dot products:
/// `QT[i][j] = QT[i-1][j-1] - T[j-1]*T[i-1] + T[j+m-1]*T[i+m-1]`
///
/// This allows O(1) updates per element instead of O(m), giving O(n^2) total
/// instead of O(n^2 * m) for the naive approach.
///
/// Two paths:
/// - **Built-in metric**: diagonal traversal with incremental QT updates and
///   [`ZNormalizedEuclidean::qt_to_distance`]. Runs in parallel with the
///   `parallel` feature.
/// - **Custom metric**: same diagonal order, but the distance function is
///   called on the two materialized subsequences of every pair. Always serial;
///   the first failure aborts the computation.
///
/// Every evaluated pair updates both rows `i` and `j`.
#[instrument(skip(ts, metric), fields(n = ts.len(), m = config.m, r = config.exclusion_radius))]
pub fn stomp(ts: &[f64], config: &MatrixProfileConfig, metric: Metric<'_>) -> Result<MatrixProfile> {
    let m = config.m;
    let n = ts.len();
    validate_k(m, n, Operand::Series)?;
    check_finite(ts, Operand::Series)?;

    let n_subs = n - m + 1;
    // Diagonals t < r are trivial; with r = 0 the main diagonal is a match
    let first_diag = config.exclusion_radius;
    debug!(n_subs, first_diag, robust = config.robust, custom = metric.is_custom(), "self-join");

    let acc = match metric {
        Metric::ZNormalized => {
            let stats = RollingStats::with_strategy(ts, m, config.stats)?;
            let qt_first = sliding_dot_product(&ts[0..m], ts);
            let cx = DiagCtx {
                ts,
                m,
                n_subs,
                qt_first: &qt_first,
                stats: &stats,
            };
            run_diagonals(&cx, first_diag, config.robust)
        }
        Metric::Custom(f) => stomp_custom(ts, m, n_subs, first_diag, config.robust, f)?,
    };

    Ok(acc.into_matrix_profile(m, config.exclusion_radius))
}

/// Read-only state shared by the diagonal workers.
struct DiagCtx<'a> {
    ts: &'a [f64],
    m: usize,
    n_subs: usize,
    qt_first: &'a [f64],
    stats: &'a RollingStats,
}

fn run_diagonals(cx: &DiagCtx<'_>, first_diag: usize, robust: bool) -> ProfileAccumulator {
    #[cfg(feature = "parallel")]
    if cx.n_subs >= MIN_PARALLEL_SUBS {
        return stomp_diagonal_parallel(cx, first_diag, robust);
    }

    let mut acc = ProfileAccumulator::new(cx.n_subs, robust);
    process_diagonals(cx, first_diag, cx.n_subs, &mut acc);
    acc
}

/// Diagonal-traversal STOMP over diagonals `[start_t, end_t)`.
///
/// Each diagonal `t` contains pairs `(i, j)` where `j = i + t`. The first cell
/// comes from `qt_first`, the rest from the QT recurrence along the diagonal.
#[inline]
fn process_diagonals(
    cx: &DiagCtx<'_>,
    start_t: usize,
    end_t: usize,
    acc: &mut ProfileAccumulator,
) {
    let DiagCtx {
        ts,
        m,
        n_subs,
        qt_first,
        stats,
    } = *cx;

    for t in start_t..end_t {
        let mut qt = qt_first[t];
        let d = ZNormalizedEuclidean::qt_to_distance(qt, 0, t, m, stats, stats);
        acc.update_pair(0, t, d);

        for i in 1..(n_subs - t) {
            let j = i + t;
            qt = qt - ts[i - 1] * ts[j - 1] + ts[i + m - 1] * ts[j + m - 1];
            let d = ZNormalizedEuclidean::qt_to_distance(qt, i, j, m, stats, stats);
            acc.update_pair(i, j, d);
        }
    }
}

/// Parallel diagonal STOMP with load-balanced chunking.
///
/// Each chunk of diagonals fills a private accumulator; the merge uses the
/// same comparison as `update`, so the result does not depend on scheduling.
#[cfg(feature = "parallel")]
fn stomp_diagonal_parallel(cx: &DiagCtx<'_>, first_diag: usize, robust: bool) -> ProfileAccumulator {
    use rayon::prelude::*;

    use crate::algorithms::common::compute_diagonal_ranges;

    let n_threads = rayon::current_num_threads();
    let ranges = compute_diagonal_ranges(first_diag, cx.n_subs, n_threads);

    let results: Vec<ProfileAccumulator> = ranges
        .into_par_iter()
        .map(|(start_t, end_t)| {
            let mut acc = ProfileAccumulator::new(cx.n_subs, robust);
            process_diagonals(cx, start_t, end_t, &mut acc);
            acc
        })
        .collect();

    let mut combined = ProfileAccumulator::new(cx.n_subs, robust);
    for result in &results {
        combined.merge(result);
    }
    combined
}

/// Diagonal traversal calling a caller-supplied distance for every pair.
fn stomp_custom(
    ts: &[f64],
    m: usize,
    n_subs: usize,
    first_diag: usize,
    robust: bool,
    f: &dyn DistanceFunction,
) -> Result<ProfileAccumulator> {
    let mut acc = ProfileAccumulator::new(n_subs, robust);
    for t in first_diag..n_subs {
        for i in 0..(n_subs - t) {
            let j = i + t;
            let d = checked_distance(f, window(ts, i, m), window(ts, j, m))?;
            acc.update_pair(i, j, d);
        }
    }
    Ok(acc)
}

/// Compute the matrix profile with the row-wise STOMP traversal.
///
/// Row `i` holds `QT[i][j]` for every `j`; row `i + 1` is derived from it
/// with the QT recurrence into a second buffer, and the two buffers are
/// swapped after every row. Only the upper triangle outside the exclusion
/// zone is evaluated, each pair updating both rows.
///
/// Exposed for cross-checking and benchmarking against the diagonal
/// traversal. Built-in metric only.
#[instrument(skip(ts), fields(n = ts.len(), m = config.m, r = config.exclusion_radius))]
pub fn stomp_rowwise(ts: &[f64], config: &MatrixProfileConfig) -> Result<MatrixProfile> {
    let m = config.m;
    let n = ts.len();
    validate_k(m, n, Operand::Series)?;
    check_finite(ts, Operand::Series)?;

    let n_subs = n - m + 1;
    let first_diag = config.exclusion_radius;
    let stats = RollingStats::with_strategy(ts, m, config.stats)?;
    let mut acc = ProfileAccumulator::new(n_subs, config.robust);

    // First column of QT: QT[i][0] = QT[0][i]
    let qt_first = sliding_dot_product(&ts[0..m], ts);
    let mut qt = qt_first.clone();
    let mut qt_next = vec![0.0; n_subs];

    for i in 0..n_subs {
        if i > 0 {
            qt_next[0] = qt_first[i];
            for j in 1..n_subs {
                qt_next[j] = qt[j - 1] - ts[j - 1] * ts[i - 1] + ts[j + m - 1] * ts[i + m - 1];
            }
            std::mem::swap(&mut qt, &mut qt_next);
        }

        for j in i.saturating_add(first_diag)..n_subs {
            let d = ZNormalizedEuclidean::qt_to_distance(qt[j], i, j, m, &stats, &stats);
            acc.update_pair(i, j, d);
        }
    }

    Ok(acc.into_matrix_profile(m, config.exclusion_radius))
}
