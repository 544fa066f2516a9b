use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Operand, ProfileError, Result};

/// Metadata carried from an input series to every derived series.
///
/// The profilers never interpret it; they only rename the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Metadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
        }
    }

    /// Copy of this metadata with `suffix` appended to the name.
    pub fn renamed(&self, suffix: &str) -> Self {
        Self {
            name: format!("{}{}", self.name, suffix),
            labels: self.labels.clone(),
        }
    }
}

/// Read-only access to an ordered, evenly spaced time series.
///
/// The profilers only rely on this trait, so any storage can feed them.
/// Indices are positions in time order once the series is sorted.
pub trait SeriesView {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value_at(&self, index: usize) -> f64;

    fn tick_at(&self, index: usize) -> i64;

    /// Tick delta between consecutive samples (0 for fewer than 2 samples).
    fn spacing(&self) -> i64;

    /// True when the ticks, in time order, are strictly increasing with a
    /// constant spacing and no missing bucket.
    fn is_uniform_and_filled(&self) -> bool;

    fn metadata(&self) -> Metadata {
        Metadata::default()
    }

    fn location_at(&self, _index: usize) -> Option<i64> {
        None
    }

    fn elevation_at(&self, _index: usize) -> Option<i64> {
        None
    }
}

/// In-memory time series with optional location and elevation channels.
///
/// Also the result type of every profiling operation: profile series store
/// the distance as value and the neighbor index in the elevation channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    metadata: Metadata,
    ticks: Vec<i64>,
    values: Vec<f64>,
    locations: Option<Vec<i64>>,
    elevations: Option<Vec<i64>>,
}

impl Series {
    /// Build a series from parallel tick and value vectors, in any order.
    pub fn new(metadata: Metadata, ticks: Vec<i64>, values: Vec<f64>) -> Result<Self> {
        if ticks.len() != values.len() {
            return Err(ProfileError::LengthMismatch {
                ticks: ticks.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            metadata,
            ticks,
            values,
            locations: None,
            elevations: None,
        })
    }

    pub(crate) fn from_parts(metadata: Metadata, ticks: Vec<i64>, values: Vec<f64>) -> Self {
        debug_assert_eq!(ticks.len(), values.len());
        Self {
            metadata,
            ticks,
            values,
            locations: None,
            elevations: None,
        }
    }

    /// Build an evenly spaced series whose first sample sits at `first_tick`.
    pub fn regular(metadata: Metadata, first_tick: i64, spacing: i64, values: Vec<f64>) -> Self {
        let ticks = (0..values.len() as i64)
            .map(|i| first_tick + i * spacing)
            .collect();
        Self {
            metadata,
            ticks,
            values,
            locations: None,
            elevations: None,
        }
    }

    /// Evenly spaced series with ticks `0, 1, 2, ...`.
    pub fn from_values(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::regular(Metadata::named(name), 0, 1, values)
    }

    pub fn with_elevations(mut self, elevations: Vec<i64>) -> Self {
        debug_assert_eq!(elevations.len(), self.values.len());
        self.elevations = Some(elevations);
        self
    }

    pub fn with_locations(mut self, locations: Vec<i64>) -> Self {
        debug_assert_eq!(locations.len(), self.values.len());
        self.locations = Some(locations);
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn ticks(&self) -> &[i64] {
        &self.ticks
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn elevations(&self) -> Option<&[i64]> {
        self.elevations.as_deref()
    }

    pub fn locations(&self) -> Option<&[i64]> {
        self.locations.as_deref()
    }

    pub fn is_sorted_by_time(&self) -> bool {
        self.ticks.windows(2).all(|w| w[0] <= w[1])
    }

    /// Sort samples by tick, in place. Idempotent.
    pub fn sort_by_time(&mut self) {
        if self.is_sorted_by_time() {
            return;
        }
        let mut order: Vec<usize> = (0..self.ticks.len()).collect();
        order.sort_by_key(|&i| self.ticks[i]);

        self.ticks = order.iter().map(|&i| self.ticks[i]).collect();
        self.values = order.iter().map(|&i| self.values[i]).collect();
        self.locations = self
            .locations
            .take()
            .map(|loc| order.iter().map(|&i| loc[i]).collect());
        self.elevations = self
            .elevations
            .take()
            .map(|elev| order.iter().map(|&i| elev[i]).collect());
    }

    /// Copy any view into an owned series sorted by time.
    pub fn collect_sorted<S: SeriesView + ?Sized>(view: &S) -> Self {
        let n = view.len();
        let ticks: Vec<i64> = (0..n).map(|i| view.tick_at(i)).collect();
        let values: Vec<f64> = (0..n).map(|i| view.value_at(i)).collect();
        let locations = if (0..n).any(|i| view.location_at(i).is_some()) {
            Some((0..n).map(|i| view.location_at(i).unwrap_or(i64::MIN)).collect())
        } else {
            None
        };
        let elevations = if (0..n).any(|i| view.elevation_at(i).is_some()) {
            Some((0..n).map(|i| view.elevation_at(i).unwrap_or(i64::MIN)).collect())
        } else {
            None
        };

        let mut series = Self {
            metadata: view.metadata(),
            ticks,
            values,
            locations,
            elevations,
        };
        series.sort_by_time();
        series
    }

    pub(crate) fn last_tick(&self) -> i64 {
        self.ticks.last().copied().unwrap_or(0)
    }
}

impl SeriesView for Series {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn value_at(&self, index: usize) -> f64 {
        self.values[index]
    }

    fn tick_at(&self, index: usize) -> i64 {
        self.ticks[index]
    }

    fn spacing(&self) -> i64 {
        if self.ticks.len() < 2 {
            return 0;
        }
        let min = self.ticks.iter().min().copied().unwrap_or(0);
        let max = self.ticks.iter().max().copied().unwrap_or(0);
        (max - min) / (self.ticks.len() as i64 - 1)
    }

    fn is_uniform_and_filled(&self) -> bool {
        if self.ticks.len() < 2 {
            return true;
        }
        let mut sorted = self.ticks.clone();
        sorted.sort_unstable();
        let step = sorted[1] - sorted[0];
        step > 0 && sorted.windows(2).all(|w| w[1] - w[0] == step)
    }

    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn location_at(&self, index: usize) -> Option<i64> {
        self.locations.as_ref().map(|l| l[index])
    }

    fn elevation_at(&self, index: usize) -> Option<i64> {
        self.elevations.as_ref().map(|e| e[index])
    }
}

/// A bare slice is a series with ticks `0, 1, 2, ...`.
impl SeriesView for [f64] {
    fn len(&self) -> usize {
        <[f64]>::len(self)
    }

    fn value_at(&self, index: usize) -> f64 {
        self[index]
    }

    fn tick_at(&self, index: usize) -> i64 {
        index as i64
    }

    fn spacing(&self) -> i64 {
        i64::from(<[f64]>::len(self) > 1)
    }

    fn is_uniform_and_filled(&self) -> bool {
        true
    }
}

impl SeriesView for Vec<f64> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn value_at(&self, index: usize) -> f64 {
        self[index]
    }

    fn tick_at(&self, index: usize) -> i64 {
        index as i64
    }

    fn spacing(&self) -> i64 {
        SeriesView::spacing(self.as_slice())
    }

    fn is_uniform_and_filled(&self) -> bool {
        true
    }
}

/// Sorted, validated copy of an input series ready for profiling.
#[derive(Debug, Clone)]
pub(crate) struct Prepared {
    pub series: Series,
    pub spacing: i64,
}

impl Prepared {
    pub fn values(&self) -> &[f64] {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.values().len()
    }

    /// Tick of the last sample of the subsequence starting at `i`.
    ///
    /// `tick_i = lastTick - (p - 1 - i) * spacing`.
    pub fn end_tick(&self, i: usize, k: usize) -> i64 {
        let p = self.len() - k + 1;
        self.series.last_tick() - (p - 1 - i) as i64 * self.spacing
    }

    /// Tick of the last sample of the first subsequence.
    pub fn first_end_tick(&self, k: usize) -> i64 {
        self.end_tick(0, k)
    }
}

/// Check domain and spacing of `view`, then copy it in time order.
pub(crate) fn prepare<S: SeriesView + ?Sized>(view: &S, operand: Operand) -> Result<Prepared> {
    if !view.is_uniform_and_filled() {
        return Err(ProfileError::NotUniform { operand });
    }
    let series = Series::collect_sorted(view);
    if let Some(index) = series.values().iter().position(|v| !v.is_finite()) {
        return Err(ProfileError::NonFinite { operand, index });
    }
    let spacing = view.spacing();
    Ok(Prepared { series, spacing })
}
