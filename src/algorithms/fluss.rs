use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::algorithms::common::apply_exclusion_zone;
use crate::error::{ProfileError, Result};

/// Result of FLUSS segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationResult {
    /// Corrected Arc Curve, one value per profile entry. Values near 0
    /// indicate regime boundaries; the first and last `window` entries are 1.
    pub cac: Vec<f64>,
    /// Window used to neutralize the edges.
    pub window: usize,
}

impl SegmentationResult {
    pub fn len(&self) -> usize {
        self.cac.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cac.is_empty()
    }

    /// Up to `count` regime boundaries, most confident first.
    ///
    /// Greedy argmin over the CAC; after each pick, positions within
    /// `exclusion` of it are ignored. Stops early once only values `>= 1`
    /// remain.
    pub fn regimes(&self, count: usize, exclusion: usize) -> Vec<usize> {
        let mut working = self.cac.clone();
        let mut boundaries = Vec::with_capacity(count);

        for _ in 0..count {
            let best = working
                .iter()
                .enumerate()
                .filter(|(_, v)| **v < 1.0)
                .min_by(|(_, a), (_, b)| a.total_cmp(b));
            let Some((idx, _)) = best else {
                break;
            };
            boundaries.push(idx);
            apply_exclusion_zone(&mut working, idx, exclusion);
        }

        boundaries
    }
}

/// Ideal arc count at position `i` of a profile of length `n`, assuming
/// neighbors are drawn uniformly at random: the parabola `h - (i - h)^2 / h`
/// with `h = n / 2`.
#[inline]
fn ideal_arc_curve(n: usize, i: usize) -> f64 {
    let h = n as f64 / 2.0;
    let a = 1.0 / h;
    let x = i as f64 - h;
    h - a * x * x
}

/// Convert an elevation channel to neighbor indices. `-1` marks a row
/// without a neighbor.
pub fn neighbors_from_elevations(elevations: &[i64]) -> Result<Vec<Option<usize>>> {
    elevations
        .iter()
        .enumerate()
        .map(|(index, &e)| match e {
            -1 => Ok(None),
            e if e >= 0 && (e as u64) < elevations.len() as u64 => Ok(Some(e as usize)),
            e => Err(ProfileError::InvalidNeighbor { index, neighbor: e }),
        })
        .collect()
}

/// Perform FLUSS segmentation on a matrix profile index.
///
/// FLUSS (Fast Low-cost Unipotent Semantic Segmentation) detects regime changes
/// in time series by analyzing the arc structure of the matrix profile index.
/// Positions where few arcs cross indicate semantic boundaries.
///
/// Each entry `i` with neighbor `nn` adds an arc over `(min(i, nn), max(i, nn)]`.
/// The arc counts are divided by the ideal curve and clamped to `[0, 1]`; the
/// first and last `window` entries are forced to `1.0`. Entries without a
/// neighbor contribute no arc.
///
/// # Errors
///
/// - [`ProfileError::InvalidWindow`] if `window < 2`
/// - [`ProfileError::InvalidNeighbor`] if a neighbor index is `>= neighbors.len()`
///
/// # References
/// Gharghabi et al., "Matrix Profile VIII: Domain Agnostic Online Semantic
/// Segmentation at Superhuman Performance Levels", ICDM 2017.
#[instrument(skip(neighbors), fields(n = neighbors.len()))]
pub fn fluss(neighbors: &[Option<usize>], window: usize) -> Result<SegmentationResult> {
    if window < 2 {
        return Err(ProfileError::InvalidWindow { window });
    }
    let n = neighbors.len();

    // Difference array: +1 where an arc starts, -1 where it ends
    let mut deltas = vec![0.0f64; n + 1];
    for (i, nn) in neighbors.iter().enumerate() {
        let Some(nn) = *nn else {
            continue;
        };
        if nn >= n {
            return Err(ProfileError::InvalidNeighbor {
                index: i,
                neighbor: i64::try_from(nn).unwrap_or(i64::MAX),
            });
        }
        let small = i.min(nn);
        let large = i.max(nn);
        deltas[small + 1] += 1.0;
        deltas[large] -= 1.0;
    }

    let mut cac = vec![1.0; n];
    let mut running = 0.0;
    for i in 0..n.saturating_sub(window) {
        running += deltas[i];
        let ideal = ideal_arc_curve(n, i);
        cac[i] = if ideal > 0.0 {
            (running / ideal).clamp(0.0, 1.0)
        } else {
            1.0
        };
    }

    let edge = window.min(n);
    for v in cac.iter_mut().take(edge) {
        *v = 1.0;
    }
    for v in cac.iter_mut().skip(n - edge) {
        *v = 1.0;
    }

    debug!(window, "corrected arc curve computed");
    Ok(SegmentationResult { cac, window })
}
