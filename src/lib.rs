pub mod algorithms;
pub mod config;
pub mod core;
pub mod error;
pub mod metrics;
pub mod registry;

pub use crate::algorithms::ab_join::ab_join;
pub use crate::algorithms::fluss::{fluss, neighbors_from_elevations, SegmentationResult};
pub use crate::algorithms::row::row_profile;
pub use crate::algorithms::stomp::{stomp, stomp_rowwise, MatrixProfileConfig};
pub use crate::config::{Capabilities, ProfileOptions, SizeLimits};
pub use crate::core::distance_metric::{DistanceError, DistanceFunction, Metric};
pub use crate::core::matrix_profile::{
    JoinProfile, MatrixProfile, RobustProfile, RollingStats, RowProfile, StatsStrategy,
};
pub use crate::core::series::{Metadata, Series, SeriesView};
pub use crate::core::subsequence::subsequence;
pub use crate::error::{Operand, ProfileError, Result};
pub use crate::metrics::absolute::AbsoluteEuclidean;
pub use crate::metrics::euclidean::ZNormalizedEuclidean;
pub use crate::registry::{dispatch, Operation, Request};

use tracing::{debug, instrument};

use crate::algorithms::common::{check_size, resolve_radius};
use crate::core::series::{prepare, Prepared};

/// Elevation written for a profile entry without a neighbor.
pub const NO_NEIGHBOR: i64 = -1;

/// High-level facade: validates series, enforces size limits and turns
/// profiles back into series.
///
/// Every output series is end-aligned: entry `i` sits at the tick of the last
/// sample of subsequence `i`, keeps the input's spacing and metadata, and has
/// its name suffixed with the operation.
///
/// # Examples
///
/// ```
/// use mprofile::{ProfileOptions, Profiler, Series, SeriesView};
///
/// let ts = Series::from_values("cpu", vec![1.0, 2.0, 3.0, 2.0, 1.0, 2.0, 3.0, 2.0, 1.0]);
/// let profiler = Profiler::new();
/// let mp = profiler.profile(&ts, &ProfileOptions::new(4), None).unwrap();
/// assert_eq!(mp.len(), ts.len() - 4 + 1);
/// assert_eq!(mp.name(), "cpu::profile");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Profiler {
    limits: SizeLimits,
}

impl Profiler {
    /// Profiler with the default size limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Profiler with configured size limits.
    pub fn with_limits(limits: SizeLimits) -> Self {
        Self { limits }
    }

    /// Profiler for a caller holding `capabilities`, which override the
    /// configured limits.
    pub fn for_caller(limits: SizeLimits, capabilities: &Capabilities) -> Result<Self> {
        Ok(Self {
            limits: limits.resolve(capabilities)?,
        })
    }

    pub fn limits(&self) -> &SizeLimits {
        &self.limits
    }

    /// Self-join matrix profile as returned by the engine, both ranks included.
    #[instrument(skip(self, series, distance), fields(n = series.len(), k = options.subsequence_length))]
    pub fn self_join<S: SeriesView + ?Sized>(
        &self,
        series: &S,
        options: &ProfileOptions,
        distance: Option<&dyn DistanceFunction>,
    ) -> Result<MatrixProfile> {
        Ok(self.self_join_prepared(series, options, distance)?.1)
    }

    fn self_join_prepared<S: SeriesView + ?Sized>(
        &self,
        series: &S,
        options: &ProfileOptions,
        distance: Option<&dyn DistanceFunction>,
    ) -> Result<(Prepared, MatrixProfile)> {
        check_size(Operand::Series, series.len(), self.limits.profile)?;
        let prepared = prepare(series, Operand::Series)?;
        let config = self.config(options)?;
        let mp = stomp(prepared.values(), &config, Metric::from_option(distance))?;
        Ok((prepared, mp))
    }

    fn config(&self, options: &ProfileOptions) -> Result<MatrixProfileConfig> {
        let k = options.subsequence_length;
        let r = resolve_radius(options.exclusion_radius, k)?;
        Ok(MatrixProfileConfig::new(k)
            .with_exclusion_radius(r)
            .with_robust(options.robust)
            .with_stats(options.stats))
    }

    /// Self-join matrix profile as a series.
    ///
    /// Value is the distance, elevation the neighbor index (`-1` when the
    /// exclusion zone leaves none). In robust mode the second-nearest rank
    /// is reported.
    #[instrument(skip(self, series, distance), fields(n = series.len(), k = options.subsequence_length))]
    pub fn profile<S: SeriesView + ?Sized>(
        &self,
        series: &S,
        options: &ProfileOptions,
        distance: Option<&dyn DistanceFunction>,
    ) -> Result<Series> {
        let (prepared, mp) = self.self_join_prepared(series, options, distance)?;
        let k = mp.m;
        let (distances, indices) = mp.reported();

        let ticks = (0..mp.len()).map(|i| prepared.end_tick(i, k)).collect();
        let elevations = indices
            .iter()
            .map(|j| j.map_or(NO_NEIGHBOR, |j| j as i64))
            .collect();
        let metadata = prepared.series.metadata().renamed("::profile");
        debug!(p = mp.len(), robust = mp.robust.is_some(), "profile series built");

        Ok(Series::from_parts(metadata, ticks, distances.to_vec()).with_elevations(elevations))
    }

    /// Distances from the subsequence starting at `index` to every
    /// subsequence outside its exclusion zone.
    ///
    /// Excluded positions are absent from the output; each entry carries the
    /// index of the compared subsequence as its elevation.
    #[instrument(skip(self, series, distance), fields(n = series.len(), k = options.subsequence_length))]
    pub fn row_profile<S: SeriesView + ?Sized>(
        &self,
        series: &S,
        index: usize,
        options: &ProfileOptions,
        distance: Option<&dyn DistanceFunction>,
    ) -> Result<Series> {
        check_size(Operand::Series, series.len(), self.limits.profile)?;
        let prepared = prepare(series, Operand::Series)?;
        let config = self.config(options)?;
        let row = row_profile(prepared.values(), index, &config, Metric::from_option(distance))?;

        let k = row.m;
        let ticks = row.indices.iter().map(|&j| prepared.end_tick(j, k)).collect();
        let elevations = row.indices.iter().map(|&j| j as i64).collect();
        let metadata = prepared
            .series
            .metadata()
            .renamed(&format!("::rprofile::{index}"));

        Ok(Series::from_parts(metadata, ticks, row.distances).with_elevations(elevations))
    }

    /// For each subsequence of `a`, the nearest subsequence of `b`.
    ///
    /// The output follows `a`'s ticks; elevation is the neighbor index in `b`.
    /// Only `subsequence_length` and `stats` are read from `options`.
    #[instrument(skip(self, a, b, distance), fields(n_a = a.len(), n_b = b.len(), k = options.subsequence_length))]
    pub fn ab_profile<A, B>(
        &self,
        a: &A,
        b: &B,
        options: &ProfileOptions,
        distance: Option<&dyn DistanceFunction>,
    ) -> Result<Series>
    where
        A: SeriesView + ?Sized,
        B: SeriesView + ?Sized,
    {
        check_size(Operand::SeriesA, a.len(), self.limits.ab_profile)?;
        check_size(Operand::SeriesB, b.len(), self.limits.ab_profile)?;
        let pa = prepare(a, Operand::SeriesA)?;
        let pb = prepare(b, Operand::SeriesB)?;
        let k = options.subsequence_length;
        let jp = ab_join(
            pa.values(),
            pb.values(),
            k,
            options.stats,
            Metric::from_option(distance),
        )?;

        let ticks = (0..jp.len()).map(|i| pa.end_tick(i, k)).collect();
        let elevations = jp.indices.iter().map(|&j| j as i64).collect();
        let metadata = pa
            .series
            .metadata()
            .renamed(&format!("::abprofile::{}", pb.series.name()));

        Ok(Series::from_parts(metadata, ticks, jp.distances).with_elevations(elevations))
    }

    /// FLUSS corrected arc curve of a profile series.
    ///
    /// Neighbors are read from the elevation channel, as written by
    /// [`Profiler::profile`]. The output keeps the profile's ticks.
    #[instrument(skip(self, profile), fields(n = profile.len()))]
    pub fn fluss<S: SeriesView + ?Sized>(&self, profile: &S, window: usize) -> Result<Series> {
        if window < 2 {
            return Err(ProfileError::InvalidWindow { window });
        }
        // Profile values may be infinite, so only the spacing is checked
        if !profile.is_uniform_and_filled() {
            return Err(ProfileError::NotUniform {
                operand: Operand::Series,
            });
        }
        let sorted = Series::collect_sorted(profile);
        let elevations = sorted.elevations().ok_or(ProfileError::MissingNeighbors)?;
        let neighbors = neighbors_from_elevations(elevations)?;
        let result = fluss(&neighbors, window)?;

        let metadata = sorted.metadata().renamed("::fluss");
        Ok(Series::from_parts(metadata, sorted.ticks().to_vec(), result.cac))
    }

    /// Subsequence of length `k` starting at `start`.
    #[instrument(skip(self, series), fields(n = series.len()))]
    pub fn subsequence<S: SeriesView + ?Sized>(
        &self,
        series: &S,
        k: usize,
        start: usize,
    ) -> Result<Series> {
        subsequence(series, k, start)
    }
}
