use mprofile::algorithms::common::default_exclusion_radius;
use mprofile::{
    ab_join, fluss, stomp, stomp_rowwise, DistanceFunction, MatrixProfileConfig, Metadata, Metric,
    ProfileOptions, Profiler, Series, SeriesView, StatsStrategy, ZNormalizedEuclidean,
};

const EPSILON: f64 = 1e-6;

fn noisy_signal(n: usize, seed: u64) -> Vec<f64> {
    // Small LCG so the fixtures stay deterministic without extra deps
    let mut state = seed;
    (0..n)
        .map(|i| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let noise = ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5;
            (i as f64 * 0.3).sin() + 0.3 * noise
        })
        .collect()
}

fn brute_force(ts: &[f64], m: usize, r: usize) -> Vec<f64> {
    let p = ts.len() - m + 1;
    (0..p)
        .map(|i| {
            (0..p)
                .filter(|&j| i.abs_diff(j) >= r)
                .map(|j| {
                    ZNormalizedEuclidean
                        .distance(&ts[i..i + m], &ts[j..j + m])
                        .unwrap()
                })
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

fn assert_profile_match(name: &str, got: &[f64], expected: &[f64], epsilon: f64) {
    assert_eq!(got.len(), expected.len(), "{name}: length mismatch");
    for (i, (&g, &e)) in got.iter().zip(expected).enumerate() {
        if e.is_infinite() {
            assert!(g.is_infinite(), "{name}[{i}]: expected inf, got {g}");
        } else {
            assert!(
                (g - e).abs() < epsilon,
                "{name}[{i}]: got {g}, expected {e} (diff {})",
                (g - e).abs()
            );
        }
    }
}

#[test]
fn test_self_join_matches_brute_force() {
    let ts = noisy_signal(20, 7);
    let m = 4;
    let r = default_exclusion_radius(m);
    let mp = stomp(&ts, &MatrixProfileConfig::new(m), Metric::ZNormalized).unwrap();
    assert_profile_match("stomp", &mp.profile, &brute_force(&ts, m, r), EPSILON);
}

#[test]
fn test_diagonal_and_rowwise_agree() {
    let ts = noisy_signal(300, 11);
    for m in [5, 16, 40] {
        let config = MatrixProfileConfig::new(m);
        let diag = stomp(&ts, &config, Metric::ZNormalized).unwrap();
        let rows = stomp_rowwise(&ts, &config).unwrap();
        assert_profile_match(&format!("m={m}"), &diag.profile, &rows.profile, EPSILON);
    }
}

#[test]
fn test_shape_and_non_negativity() {
    let ts = noisy_signal(120, 3);
    for m in [2, 8, 119] {
        let mp = stomp(&ts, &MatrixProfileConfig::new(m), Metric::ZNormalized).unwrap();
        assert_eq!(mp.len(), ts.len() - m + 1);
        assert_eq!(mp.profile_index.len(), mp.len());
        for (i, &d) in mp.profile.iter().enumerate() {
            assert!(d >= 0.0 || d.is_infinite(), "profile[{i}] = {d}");
        }
    }
}

#[test]
fn test_neighbors_respect_exclusion_zone() {
    let ts = noisy_signal(150, 5);
    let m = 12;
    for r in [0, 3, 10, 40] {
        let config = MatrixProfileConfig::new(m).with_exclusion_radius(r);
        let mp = stomp(&ts, &config, Metric::ZNormalized).unwrap();
        for (i, nn) in mp.profile_index.iter().enumerate() {
            if let Some(j) = nn {
                assert!(i.abs_diff(*j) >= r, "r={r}: {i} -> {j}");
            }
        }
    }
}

#[test]
fn test_profile_is_symmetric_on_mutual_neighbors() {
    let ts = noisy_signal(200, 13);
    let mp = stomp(&ts, &MatrixProfileConfig::new(10), Metric::ZNormalized).unwrap();
    for (i, nn) in mp.profile_index.iter().enumerate() {
        let Some(j) = *nn else { continue };
        // d(i, j) bounds the profile of j from above
        assert!(
            mp.profile[j] <= mp.profile[i] + EPSILON,
            "profile[{j}] = {} > profile[{i}] = {}",
            mp.profile[j],
            mp.profile[i]
        );
    }
}

#[test]
fn test_ramp_series() {
    let ts: Vec<f64> = (0..10).map(|i| i as f64).collect();
    let mp = stomp(&ts, &MatrixProfileConfig::new(3), Metric::ZNormalized).unwrap();
    assert_eq!(mp.len(), 8);
    for (i, &d) in mp.profile.iter().enumerate() {
        assert!(d.abs() < EPSILON, "ramp windows are all identical, got {d} at {i}");
    }
    // ties go to the nearest offset, then the lower index
    assert_eq!(mp.profile_index[0], Some(1));
    for i in 1..8 {
        assert_eq!(mp.profile_index[i], Some(i - 1));
    }
}

#[test]
fn test_ab_join_of_series_with_itself() {
    let ts = noisy_signal(80, 21);
    let m = 8;
    let jp = ab_join(&ts, &ts, m, StatsStrategy::Windowed, Metric::ZNormalized).unwrap();
    assert_eq!(jp.len(), ts.len() - m + 1);
    for (i, (&d, &j)) in jp.distances.iter().zip(&jp.indices).enumerate() {
        assert!(d < EPSILON, "distance[{i}] = {d}");
        assert_eq!(j, i);
    }
}

#[test]
fn test_sliding_stats_track_windowed() {
    let ts = noisy_signal(400, 17);
    let windowed = MatrixProfileConfig::new(20);
    let sliding = windowed.with_stats(StatsStrategy::Sliding);
    let a = stomp(&ts, &windowed, Metric::ZNormalized).unwrap();
    let b = stomp(&ts, &sliding, Metric::ZNormalized).unwrap();
    assert_profile_match("sliding", &b.profile, &a.profile, 1e-5);
}

#[test]
fn test_fluss_values_are_bounded() {
    let ts = noisy_signal(250, 9);
    let mp = stomp(&ts, &MatrixProfileConfig::new(10), Metric::ZNormalized).unwrap();
    let result = fluss(&mp.profile_index, 20).unwrap();
    assert_eq!(result.len(), mp.len());
    assert!(result.cac.iter().all(|v| (0.0..=1.0).contains(v)));
    assert!(result.cac[..20].iter().all(|&v| v == 1.0));
    assert!(result.cac[result.len() - 20..].iter().all(|&v| v == 1.0));
}

#[test]
fn test_facade_pipeline_keeps_ticks() {
    let values = noisy_signal(100, 4);
    let ts = Series::regular(Metadata::named("power"), 1_000, 10, values);
    let profiler = Profiler::new();
    let options = ProfileOptions::new(8);

    let mp = profiler.profile(&ts, &options, None).unwrap();
    assert_eq!(mp.len(), 93);
    assert_eq!(mp.ticks()[0], 1_000 + 7 * 10);
    assert_eq!(*mp.ticks().last().unwrap(), 1_000 + 99 * 10);

    let cac = profiler.fluss(&mp, 8).unwrap();
    assert_eq!(cac.name(), "power::profile::fluss");
    assert_eq!(cac.ticks(), mp.ticks());

    let sub = profiler.subsequence(&ts, 8, 5).unwrap();
    assert_eq!(sub.name(), "power::subsequence::5");
    assert_eq!(sub.values(), &ts.values()[5..13]);
}

#[test]
fn test_unsorted_input_is_profiled_in_time_order() {
    let values = noisy_signal(40, 2);
    let sorted = Series::from_values("s", values.clone());

    let mut ticks: Vec<i64> = (0..40).collect();
    let mut shuffled_values = values;
    ticks.reverse();
    shuffled_values.reverse();
    let shuffled =
        Series::new(Metadata::named("s"), ticks, shuffled_values).unwrap();

    let profiler = Profiler::new();
    let options = ProfileOptions::new(6);
    let a = profiler.profile(&sorted, &options, None).unwrap();
    let b = profiler.profile(&shuffled, &options, None).unwrap();
    assert_eq!(a.ticks(), b.ticks());
    assert_profile_match("shuffled", b.values(), a.values(), 1e-12);
    assert_eq!(a.elevations(), b.elevations());
}
