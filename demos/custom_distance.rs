//! Matrix profile with a caller-supplied distance.
//!
//! Any `Fn(&[f64], &[f64]) -> Result<f64, DistanceError>` can replace the
//! z-normalized Euclidean distance. Here raw Euclidean and Manhattan
//! distances are compared on a series with an amplitude change, which
//! z-normalization would hide.
//!
//! Run with: cargo run --release --example custom_distance

use mprofile::{AbsoluteEuclidean, DistanceError, ProfileOptions, Profiler, Series, SeriesView};
use tracing_subscriber::EnvFilter;

fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

fn main() -> mprofile::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let values = (0..400)
        .map(|i| {
            let amplitude = if (200..240).contains(&i) { 3.0 } else { 1.0 };
            amplitude * (i as f64 * std::f64::consts::TAU / 40.0).sin()
        })
        .collect();
    let ts = Series::from_values("signal", values);
    let options = ProfileOptions::new(40);
    let profiler = Profiler::new();

    let znorm = profiler.profile(&ts, &options, None)?;
    let euclidean = profiler.profile(&ts, &options, Some(&AbsoluteEuclidean))?;

    let manhattan = |a: &[f64], b: &[f64]| -> Result<f64, DistanceError> {
        Ok(a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum())
    };
    let l1 = profiler.profile(&ts, &options, Some(&manhattan))?;

    for (label, mp) in [("z-normalized", &znorm), ("euclidean", &euclidean), ("manhattan", &l1)] {
        match argmax(mp.values()) {
            Some((i, d)) => println!(
                "{label:>12}: most unusual window at {i} ({d:.4}), {} entries",
                mp.len()
            ),
            None => println!("{label:>12}: no finite entries"),
        }
    }

    Ok(())
}
