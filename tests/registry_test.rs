use mprofile::config::{CAPNAME_ABPROFILE_MAXSIZE, CONFIG_PROFILE_MAXSIZE};
use mprofile::registry::operation_names;
use mprofile::{
    dispatch, Capabilities, DistanceError, Metadata, Operation, ProfileError, ProfileOptions,
    Profiler, Request, Series, SeriesView, SizeLimits, StatsStrategy, NO_NEIGHBOR,
};

fn wave(name: &str, n: usize, period: f64) -> Series {
    let values = (0..n)
        .map(|i| (i as f64 * std::f64::consts::TAU / period).sin() + 0.05 * (i % 7) as f64)
        .collect();
    Series::regular(Metadata::named(name), 0, 5, values)
}

#[test]
fn test_dispatch_runs_every_operation() {
    let profiler = Profiler::new();
    let ts = wave("temp", 120, 24.0);
    let options = ProfileOptions::new(12);

    let mp = dispatch(
        &profiler,
        "MP.PROFILE",
        Request::Profile {
            series: &ts,
            options,
            distance: None,
        },
    )
    .unwrap();
    assert_eq!(mp.name(), "temp::profile");
    assert_eq!(mp.len(), 109);

    let row = dispatch(
        &profiler,
        "MP.RPROFILE",
        Request::RowProfile {
            series: &ts,
            index: 10,
            options,
            distance: None,
        },
    )
    .unwrap();
    assert_eq!(row.name(), "temp::rprofile::10");
    // r = 3 removes indices 8..=12
    assert_eq!(row.len(), 109 - 5);

    let other = wave("humidity", 90, 24.0);
    let ab = dispatch(
        &profiler,
        "MP.ABPROFILE",
        Request::AbProfile {
            a: &ts,
            b: &other,
            options,
            distance: None,
        },
    )
    .unwrap();
    assert_eq!(ab.name(), "temp::abprofile::humidity");
    assert_eq!(ab.len(), 109);

    let cac = dispatch(
        &profiler,
        "MP.FLUSS",
        Request::Fluss {
            profile: &mp,
            window: 12,
        },
    )
    .unwrap();
    assert_eq!(cac.len(), mp.len());

    let sub = dispatch(
        &profiler,
        "MP.ATBUCKETINDEX",
        Request::AtBucketIndex {
            series: &ts,
            subsequence_length: 12,
            index: 30,
        },
    )
    .unwrap();
    assert_eq!(sub.values(), &ts.values()[30..42]);
    assert_eq!(sub.ticks()[0], 150);
}

#[test]
fn test_names_are_case_sensitive() {
    assert!(matches!(
        Operation::lookup("mp.profile"),
        Err(ProfileError::UnknownOperation(_))
    ));
    assert_eq!(operation_names().len(), 5);
}

#[test]
fn test_custom_distance_through_dispatch() {
    let manhattan = |a: &[f64], b: &[f64]| -> Result<f64, DistanceError> {
        Ok(a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum())
    };
    let ts = wave("m", 60, 12.0);
    let out = dispatch(
        &Profiler::new(),
        "MP.PROFILE",
        Request::Profile {
            series: &ts,
            options: ProfileOptions::new(6),
            distance: Some(&manhattan),
        },
    )
    .unwrap();
    assert!(out.values().iter().all(|v| v.is_finite() && *v >= 0.0));
    assert!(out.elevations().unwrap().iter().all(|&e| e != NO_NEIGHBOR));
}

#[test]
fn test_failing_distance_surfaces_as_error() {
    let failing = |_: &[f64], _: &[f64]| -> Result<f64, DistanceError> {
        Err(DistanceError::new("backend unavailable"))
    };
    let ts = wave("f", 40, 10.0);
    let err = Profiler::new()
        .profile(&ts, &ProfileOptions::new(5), Some(&failing))
        .unwrap_err();
    assert!(matches!(err, ProfileError::Distance(_)));
}

#[test]
fn test_limits_from_json() {
    let limits: SizeLimits =
        serde_json::from_str(r#"{"mp.profile.maxsize": 200, "mp.abprofile.maxsize": 50}"#)
            .unwrap();
    assert_eq!(limits.profile, 200);
    assert_eq!(limits.ab_profile, 50);

    let partial: SizeLimits = serde_json::from_str(r#"{"mp.profile.maxsize": 7}"#).unwrap();
    assert_eq!(partial.ab_profile, SizeLimits::default().ab_profile);

    let caps: Capabilities =
        serde_json::from_str(r#"{"mp.abprofile.maxsize.capname": "100"}"#).unwrap();
    let profiler = Profiler::for_caller(limits, &caps).unwrap();
    assert_eq!(profiler.limits().ab_profile, 100);
    assert_eq!(profiler.limits().profile, 200);
}

#[test]
fn test_options_from_json() {
    let options: ProfileOptions = serde_json::from_str(
        r#"{"subsequence_length": 16, "exclusion_radius": -1, "stats": "sliding"}"#,
    )
    .unwrap();
    assert_eq!(options.subsequence_length, 16);
    assert_eq!(options.stats, StatsStrategy::Sliding);
    assert!(!options.robust);

    // negative radius survives parsing and is rejected by the operation
    let err = Profiler::new()
        .profile(&wave("x", 50, 10.0), &options, None)
        .unwrap_err();
    assert!(matches!(err, ProfileError::NegativeExclusionRadius { radius: -1 }));
}

#[test]
fn test_configured_limits_apply_per_operation() {
    let limits = SizeLimits::from_properties([(CONFIG_PROFILE_MAXSIZE, "64")]).unwrap();
    let caps = Capabilities::new().with(CAPNAME_ABPROFILE_MAXSIZE, "32");
    let profiler = Profiler::for_caller(limits, &caps).unwrap();

    let long = wave("long", 100, 20.0);
    let options = ProfileOptions::new(8);
    assert!(matches!(
        profiler.profile(&long, &options, None),
        Err(ProfileError::SizeLimitExceeded { len: 100, limit: 64, .. })
    ));
    assert!(matches!(
        profiler.row_profile(&long, 0, &options, None),
        Err(ProfileError::SizeLimitExceeded { limit: 64, .. })
    ));
    let short = wave("short", 30, 10.0);
    assert!(profiler.ab_profile(&short, &short, &options, None).is_ok());
    assert!(profiler.ab_profile(&short, &long, &options, None).is_err());
}
