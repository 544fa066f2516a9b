use tracing::instrument;

use crate::core::series::{prepare, Series, SeriesView};
use crate::error::{Operand, ProfileError, Result};

/// Extract the `k` samples starting at `start` as a standalone series.
///
/// Ticks, locations and elevations are carried over, so the result keeps
/// the spacing of the input. The metadata is copied and the name suffixed
/// with `::subsequence::<start>`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ProfileError::SubsequenceTooShort`] | `k < 2` |
/// | [`ProfileError::NotUniform`] | input has gaps or irregular spacing |
/// | [`ProfileError::SubsequenceTooLong`] | `k > n` |
/// | [`ProfileError::IndexOutOfRange`] | `start + k > n` |
#[instrument(skip(series), fields(n = series.len()))]
pub fn subsequence<S: SeriesView + ?Sized>(series: &S, k: usize, start: usize) -> Result<Series> {
    if k < 2 {
        return Err(ProfileError::SubsequenceTooShort { k });
    }
    let prepared = prepare(series, Operand::Series)?;
    let n = prepared.len();
    if k > n {
        return Err(ProfileError::SubsequenceTooLong {
            operand: Operand::Series,
            k,
            n,
        });
    }
    let p = n - k + 1;
    if start >= p {
        return Err(ProfileError::IndexOutOfRange {
            index: start,
            max: p - 1,
        });
    }

    Ok(extract(&prepared.series, k, start))
}

/// Slice out a window of an already validated, time-ordered series.
pub(crate) fn extract(series: &Series, k: usize, start: usize) -> Series {
    let range = start..start + k;
    let metadata = series
        .metadata()
        .renamed(&format!("::subsequence::{start}"));
    let mut out = Series::from_parts(
        metadata,
        series.ticks()[range.clone()].to_vec(),
        series.values()[range.clone()].to_vec(),
    );
    if let Some(loc) = series.locations() {
        out = out.with_locations(loc[range.clone()].to_vec());
    }
    if let Some(elev) = series.elevations() {
        out = out.with_elevations(elev[range].to_vec());
    }
    out
}

/// The values of Subsequence(start, k).
#[inline(always)]
pub(crate) fn window(ts: &[f64], start: usize, k: usize) -> &[f64] {
    &ts[start..start + k]
}
