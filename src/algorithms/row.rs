use tracing::{debug, instrument};

use crate::algorithms::common::{check_finite, sliding_dot_product, validate_k};
use crate::algorithms::stomp::MatrixProfileConfig;
use crate::core::distance_metric::{checked_distance, Metric};
use crate::core::matrix_profile::{RollingStats, RowProfile};
use crate::core::subsequence::window;
use crate::error::{Operand, ProfileError, Result};
use crate::metrics::euclidean::ZNormalizedEuclidean;

/// Distances from one query subsequence to every other subsequence of `ts`.
///
/// Subsequences with `|j - query| < exclusion_radius` are left out of the
/// result rather than reported as infinite. With a zero radius the query
/// itself is included at distance zero.
///
/// The built-in metric needs a single sliding dot product of the query
/// window against the series. `config.robust` is ignored.
#[instrument(skip(ts, metric), fields(n = ts.len(), m = config.m, r = config.exclusion_radius))]
pub fn row_profile(
    ts: &[f64],
    query: usize,
    config: &MatrixProfileConfig,
    metric: Metric<'_>,
) -> Result<RowProfile> {
    let m = config.m;
    let n = ts.len();
    validate_k(m, n, Operand::Series)?;
    check_finite(ts, Operand::Series)?;

    let n_subs = n - m + 1;
    if query >= n_subs {
        return Err(ProfileError::IndexOutOfRange {
            index: query,
            max: n_subs - 1,
        });
    }

    let r = config.exclusion_radius;
    let indices: Vec<usize> = (0..n_subs).filter(|j| j.abs_diff(query) >= r).collect();
    debug!(n_subs, kept = indices.len(), custom = metric.is_custom(), "row profile");

    let q = window(ts, query, m);
    let distances = match metric {
        Metric::ZNormalized => {
            let stats = RollingStats::with_strategy(ts, m, config.stats)?;
            let qt = sliding_dot_product(q, ts);
            indices
                .iter()
                .map(|&j| ZNormalizedEuclidean::qt_to_distance(qt[j], query, j, m, &stats, &stats))
                .collect()
        }
        Metric::Custom(f) => indices
            .iter()
            .map(|&j| checked_distance(f, q, window(ts, j, m)))
            .collect::<Result<Vec<f64>>>()?,
    };

    Ok(RowProfile {
        query,
        indices,
        distances,
        m,
        exclusion_radius: r,
    })
}
