//! Distances from one subsequence to every other subsequence.
//!
//! Run with: cargo run --release --example row_profile

use mprofile::{Metadata, ProfileOptions, Profiler, Series, SeriesView};
use tracing_subscriber::EnvFilter;

fn main() -> mprofile::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let values = (0..300)
        .map(|i| {
            let t = i as f64;
            (t * std::f64::consts::TAU / 50.0).sin() + 0.1 * (t * 0.37).cos()
        })
        .collect();
    let ts = Series::regular(Metadata::named("load"), 0, 1, values);

    let query = 40;
    let options = ProfileOptions::new(20).with_exclusion_radius(10);
    let row = Profiler::new().row_profile(&ts, query, &options, None)?;
    let indices = row.elevations().unwrap_or_default();

    println!("{}: {} comparable subsequences", row.name(), row.len());

    let mut ranked: Vec<(i64, f64)> = indices
        .iter()
        .copied()
        .zip(row.values().iter().copied())
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    println!("Closest matches to subsequence {query}:");
    for (j, d) in ranked.iter().take(5) {
        println!("  {j:>4}  {d:.4}");
    }

    Ok(())
}
