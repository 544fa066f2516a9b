use serde::{Deserialize, Serialize};

use crate::error::{Operand, ProfileError, Result};

/// Relative tolerance under which a window's standard deviation counts as zero.
///
/// A window is constant when `sigma <= CONSTANT_RTOL * |mean|`; a window of
/// exact zeros has `sigma == 0` and is caught by the same test.
pub const CONSTANT_RTOL: f64 = 1e-12;

/// Below `SLIDING_RECHECK * mean^2`, a variance from running sums is not
/// trusted and the window is recomputed with the windowed strategy.
const SLIDING_RECHECK: f64 = 1e-8;

/// How per-window statistics are accumulated.
///
/// Both strategies use Neumaier compensated summation.
///
/// - `Windowed` sums every window independently (`O(p*m)`) and computes the
///   variance from deviations to the window mean. Mean error is bounded by
///   `2*eps*max|x|` and the relative variance error is `O(eps)`, independent
///   of the series length (`eps = 2^-53`). Constant windows get an exact
///   zero standard deviation.
/// - `Sliding` derives every window from compensated running sums and sums of
///   squares (`O(n)`), with `var = E[x^2] - E[x]^2`. The absolute variance
///   error grows to `O(eps * mean^2)`; near-constant windows are recomputed
///   with the windowed strategy so that the zero-variance policy still holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsStrategy {
    #[default]
    Windowed,
    Sliding,
}

/// Neumaier compensated accumulator.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    c: f64,
}

impl CompensatedSum {
    #[inline]
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.c += (self.sum - t) + x;
        } else {
            self.c += (x - t) + self.sum;
        }
        self.sum = t;
    }

    #[inline]
    fn value(&self) -> f64 {
        self.sum + self.c
    }
}

/// Rolling mean and population standard deviation for all subsequences of length `m`.
#[derive(Debug, Clone)]
pub struct RollingStats {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    /// Precomputed `1 / (sqrt(m) * sigma)` for each subsequence.
    /// Zero for constant subsequences.
    /// Turns `(QT - m*mu_i*mu_j) / (m*sigma_i*sigma_j)` into two multiplications.
    pub m_sigma_inv: Vec<f64>,
    /// Whether any subsequence is constant.
    pub has_constant: bool,
}

impl RollingStats {
    /// Compute rolling statistics with the default windowed strategy.
    pub fn compute(ts: &[f64], m: usize) -> Result<Self> {
        Self::with_strategy(ts, m, StatsStrategy::Windowed)
    }

    /// Statistics of every window of length `m`.
    ///
    /// Fails with [`ProfileError::SubsequenceTooShort`] when `m < 2` and with
    /// [`ProfileError::SubsequenceTooLong`] when `m > ts.len()`.
    pub fn with_strategy(ts: &[f64], m: usize, strategy: StatsStrategy) -> Result<Self> {
        if m < 2 {
            return Err(ProfileError::SubsequenceTooShort { k: m });
        }
        if m > ts.len() {
            return Err(ProfileError::SubsequenceTooLong {
                operand: Operand::Series,
                k: m,
                n: ts.len(),
            });
        }

        let n_subs = ts.len() - m + 1;
        let mut mean = Vec::with_capacity(n_subs);
        let mut std = Vec::with_capacity(n_subs);

        match strategy {
            StatsStrategy::Windowed => {
                for w in ts.windows(m) {
                    let (mu, sigma) = window_moments(w);
                    mean.push(mu);
                    std.push(sigma);
                }
            }
            StatsStrategy::Sliding => {
                let m_f = m as f64;
                let mut cumsum = Vec::with_capacity(ts.len() + 1);
                let mut cumsum_sq = Vec::with_capacity(ts.len() + 1);
                let mut s = CompensatedSum::default();
                let mut sq = CompensatedSum::default();
                cumsum.push(0.0);
                cumsum_sq.push(0.0);
                for &x in ts {
                    s.add(x);
                    sq.add(x * x);
                    cumsum.push(s.value());
                    cumsum_sq.push(sq.value());
                }
                for i in 0..n_subs {
                    let mu = (cumsum[i + m] - cumsum[i]) / m_f;
                    let var = ((cumsum_sq[i + m] - cumsum_sq[i]) / m_f - mu * mu).max(0.0);
                    if var <= SLIDING_RECHECK * mu * mu {
                        let (mu, sigma) = window_moments(&ts[i..i + m]);
                        mean.push(mu);
                        std.push(sigma);
                    } else {
                        mean.push(mu);
                        std.push(var.sqrt());
                    }
                }
            }
        }

        let sqrt_m = (m as f64).sqrt();
        let mut has_constant = false;
        let m_sigma_inv = mean
            .iter()
            .zip(&std)
            .map(|(&mu, &sigma)| {
                if is_constant(mu, sigma) {
                    has_constant = true;
                    0.0
                } else {
                    1.0 / (sqrt_m * sigma)
                }
            })
            .collect();

        Ok(Self {
            mean,
            std,
            m_sigma_inv,
            has_constant,
        })
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Whether subsequence `i` has zero variance.
    #[inline]
    pub fn is_constant(&self, i: usize) -> bool {
        self.m_sigma_inv[i] == 0.0
    }
}

/// Mean and population standard deviation of one window, two-pass compensated.
pub(crate) fn window_moments(w: &[f64]) -> (f64, f64) {
    let m_f = w.len() as f64;
    let mut s = CompensatedSum::default();
    for &x in w {
        s.add(x);
    }
    let mu = s.value() / m_f;
    let mut dev = CompensatedSum::default();
    for &x in w {
        let d = x - mu;
        dev.add(d * d);
    }
    (mu, (dev.value() / m_f).max(0.0).sqrt())
}

#[inline]
pub(crate) fn is_constant(mu: f64, sigma: f64) -> bool {
    sigma <= CONSTANT_RTOL * mu.abs()
}

/// Second-nearest neighbors, populated in robust mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustProfile {
    pub profile: Vec<f64>,
    pub profile_index: Vec<Option<usize>>,
}

/// The self-join matrix profile.
///
/// A row with no admissible neighbor (possible when the exclusion radius
/// covers every other subsequence) has distance `+inf` and index `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixProfile {
    /// Nearest-neighbor distances for each subsequence.
    pub profile: Vec<f64>,
    /// Index of the nearest neighbor for each subsequence.
    pub profile_index: Vec<Option<usize>>,
    /// Second-nearest neighbors, only in robust mode.
    pub robust: Option<RobustProfile>,
    /// Subsequence length used.
    pub m: usize,
    /// Exclusion radius used.
    pub exclusion_radius: usize,
}

impl MatrixProfile {
    pub fn len(&self) -> usize {
        self.profile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profile.is_empty()
    }

    /// The rank reported to consumers: second-nearest in robust mode,
    /// nearest otherwise.
    pub fn reported(&self) -> (&[f64], &[Option<usize>]) {
        match &self.robust {
            Some(r) => (&r.profile, &r.profile_index),
            None => (&self.profile, &self.profile_index),
        }
    }
}

const NONE: usize = usize::MAX;

/// Rank of a candidate neighbor `j` for row `i` under the tie-break rule:
/// closest index first, then lowest index.
#[inline(always)]
fn tie_rank(i: usize, j: usize) -> (usize, usize) {
    if j == NONE {
        (NONE, NONE)
    } else {
        (i.abs_diff(j), j)
    }
}

/// Whether `(d, j)` beats `(cur_d, cur_j)` for row `i`.
#[inline(always)]
fn beats(i: usize, d: f64, j: usize, cur_d: f64, cur_j: usize) -> bool {
    d < cur_d || (d == cur_d && tie_rank(i, j) < tie_rank(i, cur_j))
}

#[derive(Clone, Copy)]
pub(crate) struct AccEntry {
    pub dist: f64,
    pub index: usize,
    pub second_dist: f64,
    pub second_index: usize,
}

/// Best-so-far accumulator for self-joins.
///
/// Used only during computation; converted to `MatrixProfile` at the end.
/// The comparison in `update` does not depend on the order candidates
/// arrive in, so accumulators over disjoint diagonals can be merged.
pub(crate) struct ProfileAccumulator {
    pub entries: Vec<AccEntry>,
    track_second: bool,
}

impl ProfileAccumulator {
    pub fn new(n: usize, track_second: bool) -> Self {
        Self {
            entries: vec![
                AccEntry {
                    dist: f64::INFINITY,
                    index: NONE,
                    second_dist: f64::INFINITY,
                    second_index: NONE,
                };
                n
            ],
            track_second,
        }
    }

    /// Offer neighbor `j` at distance `d` to row `i`.
    #[inline(always)]
    pub fn update(&mut self, i: usize, d: f64, j: usize) {
        let e = &mut self.entries[i];
        if beats(i, d, j, e.dist, e.index) {
            if self.track_second && e.index != NONE {
                e.second_dist = e.dist;
                e.second_index = e.index;
            }
            e.dist = d;
            e.index = j;
        } else if self.track_second && beats(i, d, j, e.second_dist, e.second_index) {
            e.second_dist = d;
            e.second_index = j;
        }
    }

    /// Offer the pair `(i, j)` to both rows. A self-match `(i, i)` is
    /// offered once.
    #[inline(always)]
    pub fn update_pair(&mut self, i: usize, j: usize, d: f64) {
        self.update(i, d, j);
        if i != j {
            self.update(j, d, i);
        }
    }

    /// Merge another accumulator built over a disjoint set of pairs.
    #[cfg(feature = "parallel")]
    pub fn merge(&mut self, other: &Self) {
        for (i, b) in other.entries.iter().enumerate() {
            if b.index != NONE {
                self.update(i, b.dist, b.index);
            }
            if b.second_index != NONE {
                self.update(i, b.second_dist, b.second_index);
            }
        }
    }

    pub fn into_matrix_profile(self, m: usize, exclusion_radius: usize) -> MatrixProfile {
        let to_opt = |j: usize| (j != NONE).then_some(j);
        let profile = self.entries.iter().map(|e| e.dist).collect();
        let profile_index = self.entries.iter().map(|e| to_opt(e.index)).collect();
        let robust = self.track_second.then(|| RobustProfile {
            profile: self.entries.iter().map(|e| e.second_dist).collect(),
            profile_index: self.entries.iter().map(|e| to_opt(e.second_index)).collect(),
        });
        MatrixProfile {
            profile,
            profile_index,
            robust,
            m,
            exclusion_radius,
        }
    }
}

/// Result of an AB-join: nearest neighbor in B for each subsequence of A.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinProfile {
    /// Nearest-neighbor distances for each subsequence of A.
    pub distances: Vec<f64>,
    /// Index of the nearest neighbor in B.
    pub indices: Vec<usize>,
    /// Subsequence length used.
    pub m: usize,
}

impl JoinProfile {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// Accumulator for AB-join. Ties follow the self-join rule: closest index
/// in B to `i`, then lowest.
pub(crate) struct JoinAccumulator {
    pub distances: Vec<f64>,
    pub indices: Vec<usize>,
}

impl JoinAccumulator {
    pub fn new(n: usize) -> Self {
        Self {
            distances: vec![f64::INFINITY; n],
            indices: vec![NONE; n],
        }
    }

    #[inline(always)]
    pub fn update(&mut self, idx: usize, dist: f64, neighbor: usize) {
        if beats(idx, dist, neighbor, self.distances[idx], self.indices[idx]) {
            self.distances[idx] = dist;
            self.indices[idx] = neighbor;
        }
    }

    #[cfg(feature = "parallel")]
    pub fn merge(&mut self, other: &Self) {
        for i in 0..self.distances.len() {
            if other.indices[i] != NONE {
                self.update(i, other.distances[i], other.indices[i]);
            }
        }
    }

    pub fn into_join_profile(self, m: usize) -> JoinProfile {
        JoinProfile {
            distances: self.distances,
            indices: self.indices,
            m,
        }
    }
}

/// One row of the distance matrix, exclusion zone omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowProfile {
    /// Index of the query subsequence.
    pub query: usize,
    /// Subsequence indices outside the exclusion zone, ascending.
    pub indices: Vec<usize>,
    /// Distance from the query to each subsequence in `indices`.
    pub distances: Vec<f64>,
    pub m: usize,
    pub exclusion_radius: usize,
}

impl RowProfile {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.distances.iter().copied())
    }
}
