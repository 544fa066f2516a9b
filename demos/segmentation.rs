//! Regime change detection with FLUSS.
//!
//! A sine regime is followed by a sawtooth regime. The corrected arc curve
//! dips where few nearest-neighbor arcs cross the boundary.
//!
//! Run with: cargo run --release --example segmentation

use mprofile::{
    dispatch, fluss, neighbors_from_elevations, Metadata, ProfileOptions, Profiler, Request,
    Series, SeriesView,
};
use tracing_subscriber::EnvFilter;

fn main() -> mprofile::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let n = 1000;
    let m = 25;
    let values = (0..n)
        .map(|i| {
            let val = if i < 500 {
                (i as f64 * std::f64::consts::TAU / 40.0).sin()
            } else {
                ((i - 500) % 25) as f64 / 25.0 * 2.0 - 1.0
            };
            val + ((i as f64 * 7.1).sin() * (i as f64 * 11.3).cos()) * 0.03
        })
        .collect();
    let ts = Series::regular(Metadata::named("machine.vibration"), 0, 10, values);

    println!("Time series length: {n}");
    println!("Subsequence length: {m}");
    println!("Expected regime change at index: 500\n");

    let profiler = Profiler::new();
    let mp = dispatch(
        &profiler,
        "MP.PROFILE",
        Request::Profile {
            series: &ts,
            options: ProfileOptions::new(m),
            distance: None,
        },
    )?;
    let cac = dispatch(
        &profiler,
        "MP.FLUSS",
        Request::Fluss {
            profile: &mp,
            window: 5 * m,
        },
    )?;
    println!("{} ({} entries)", cac.name(), cac.len());

    // Same curve through the low-level API, to read off the regimes
    let neighbors = neighbors_from_elevations(mp.elevations().unwrap_or_default())?;
    let seg = fluss(&neighbors, 5 * m)?;
    for (rank, idx) in seg.regimes(2, 5 * m).into_iter().enumerate() {
        println!(
            "  boundary #{}: index {idx}, tick {}, cac {:.4}",
            rank + 1,
            cac.ticks()[idx],
            seg.cac[idx]
        );
    }

    Ok(())
}
