//! AB-join: for each subsequence of A, its nearest subsequence in B.
//!
//! A holds two Gaussian pulses, B only one. Both pulses of A should map to
//! the single pulse of B.
//!
//! Run with: cargo run --release --example ab_join

use mprofile::{Metadata, ProfileOptions, Profiler, Series, SeriesView};
use tracing_subscriber::EnvFilter;

fn pulses(n: usize, period: f64, centers: &[f64]) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let mut val = (t * std::f64::consts::TAU / period).sin() * 0.5;
            for &c in centers {
                val += 2.0 * (-(t - c).powi(2) / 50.0).exp();
            }
            val
        })
        .collect()
}

fn main() -> mprofile::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let m = 30;
    let a = Series::regular(Metadata::named("a"), 0, 1, pulses(400, 80.0, &[100.0, 300.0]));
    let b = Series::regular(Metadata::named("b"), 0, 1, pulses(300, 55.0, &[150.0]));

    let profiler = Profiler::new();
    let ab = profiler.ab_profile(&a, &b, &ProfileOptions::new(m), None)?;
    let neighbors = ab.elevations().unwrap_or_default();

    println!("AB-join {} ({} entries)", ab.name(), ab.len());
    for center in [100usize, 300] {
        let i = center - m / 2;
        println!(
            "  A[{i}] (pulse at {center}) -> B[{}], distance {:.4}",
            neighbors[i],
            ab.values()[i]
        );
    }

    let (best, d) = ab
        .values()
        .iter()
        .copied()
        .enumerate()
        .min_by(|x, y| x.1.total_cmp(&y.1))
        .unwrap_or((0, f64::INFINITY));
    println!("\nClosest match overall: A[{best}] -> B[{}] ({d:.4})", neighbors[best]);

    Ok(())
}
