//! Self-join matrix profile of a noisy periodic signal.
//!
//! The lowest profile entry is the best motif pair; the highest finite entry
//! is the most anomalous subsequence.
//!
//! Run with: RUST_LOG=mprofile=debug cargo run --release --example basic_matrix_profile

use mprofile::{Metadata, ProfileOptions, Profiler, Series, SeriesView};
use tracing_subscriber::EnvFilter;

fn main() -> mprofile::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let n = 500;
    let m = 50;

    let values = (0..n)
        .map(|i| {
            let t = i as f64;
            let base = (t * std::f64::consts::TAU / 100.0).sin();
            let noise = ((t * 7.3).sin() * (t * 13.7).cos()) * 0.05;
            base + noise
        })
        .collect();
    // one sample per minute
    let ts = Series::regular(Metadata::named("sensor.temp"), 1_700_000_000, 60, values);

    let profiler = Profiler::new();
    let mp = profiler.profile(&ts, &ProfileOptions::new(m), None)?;

    println!("Time series length: {n}");
    println!("Subsequence length: {m}");
    println!("Profile series: {} ({} entries)", mp.name(), mp.len());

    let neighbors = mp.elevations().unwrap_or_default();
    let finite: Vec<(usize, f64)> = mp
        .values()
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, d)| d.is_finite())
        .collect();

    if let Some(&(i, d)) = finite.iter().min_by(|a, b| a.1.total_cmp(&b.1)) {
        println!("\nBest matching pair:");
        println!("  Subsequence ending at tick {}", mp.ticks()[i]);
        println!("  Nearest neighbor index {}", neighbors[i]);
        println!("  Distance: {d:.6}");
    }

    if let Some(&(i, d)) = finite.iter().max_by(|a, b| a.1.total_cmp(&b.1)) {
        println!("\nMost anomalous subsequence:");
        println!("  Index {i}, ending at tick {}", mp.ticks()[i]);
        println!("  Distance: {d:.6}");
    }

    let mean = finite.iter().map(|(_, d)| d).sum::<f64>() / finite.len().max(1) as f64;
    println!("\nMean distance: {mean:.6}");

    Ok(())
}
