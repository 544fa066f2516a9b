//! Name-to-operation table.
//!
//! Operations are registered once, on first use, under the names callers
//! use to invoke them. A [`Request`] carries the typed arguments of one call;
//! [`dispatch`] routes it to the matching [`Profiler`] method.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use tracing::debug;

use crate::config::ProfileOptions;
use crate::core::distance_metric::DistanceFunction;
use crate::core::series::{Series, SeriesView};
use crate::error::{ProfileError, Result};
use crate::Profiler;

/// The operations exposed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Subsequence extraction.
    AtBucketIndex,
    /// Self-join matrix profile.
    Profile,
    /// Single row of the distance matrix.
    RowProfile,
    /// AB-join profile.
    AbProfile,
    /// FLUSS segmentation of a profile.
    Fluss,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::AtBucketIndex,
        Operation::Profile,
        Operation::RowProfile,
        Operation::AbProfile,
        Operation::Fluss,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::AtBucketIndex => "MP.ATBUCKETINDEX",
            Operation::Profile => "MP.PROFILE",
            Operation::RowProfile => "MP.RPROFILE",
            Operation::AbProfile => "MP.ABPROFILE",
            Operation::Fluss => "MP.FLUSS",
        }
    }

    /// Look up an operation by its registered name.
    pub fn lookup(name: &str) -> Result<Operation> {
        REGISTRY
            .get(name)
            .copied()
            .ok_or_else(|| ProfileError::UnknownOperation(name.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static REGISTRY: LazyLock<HashMap<&'static str, Operation>> = LazyLock::new(|| {
    let table: HashMap<_, _> = Operation::ALL.iter().map(|op| (op.name(), *op)).collect();
    debug!(operations = table.len(), "operation registry populated");
    table
});

/// Registered operation names, sorted.
pub fn operation_names() -> Vec<&'static str> {
    let mut names: Vec<_> = REGISTRY.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Arguments of one operation call.
pub enum Request<'a> {
    AtBucketIndex {
        series: &'a dyn SeriesView,
        subsequence_length: usize,
        index: usize,
    },
    Profile {
        series: &'a dyn SeriesView,
        options: ProfileOptions,
        distance: Option<&'a dyn DistanceFunction>,
    },
    RowProfile {
        series: &'a dyn SeriesView,
        index: usize,
        options: ProfileOptions,
        distance: Option<&'a dyn DistanceFunction>,
    },
    AbProfile {
        a: &'a dyn SeriesView,
        b: &'a dyn SeriesView,
        options: ProfileOptions,
        distance: Option<&'a dyn DistanceFunction>,
    },
    Fluss {
        profile: &'a dyn SeriesView,
        window: usize,
    },
}

impl Request<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Request::AtBucketIndex { .. } => "subsequence",
            Request::Profile { .. } => "profile",
            Request::RowProfile { .. } => "row profile",
            Request::AbProfile { .. } => "ab-profile",
            Request::Fluss { .. } => "fluss",
        }
    }
}

/// Run the operation registered under `name`.
pub fn dispatch(profiler: &Profiler, name: &str, request: Request<'_>) -> Result<Series> {
    let operation = Operation::lookup(name)?;
    debug!(%operation, request = request.kind(), "dispatching");

    match (operation, request) {
        (
            Operation::AtBucketIndex,
            Request::AtBucketIndex {
                series,
                subsequence_length,
                index,
            },
        ) => profiler.subsequence(series, subsequence_length, index),
        (
            Operation::Profile,
            Request::Profile {
                series,
                options,
                distance,
            },
        ) => profiler.profile(series, &options, distance),
        (
            Operation::RowProfile,
            Request::RowProfile {
                series,
                index,
                options,
                distance,
            },
        ) => profiler.row_profile(series, index, &options, distance),
        (
            Operation::AbProfile,
            Request::AbProfile {
                a,
                b,
                options,
                distance,
            },
        ) => profiler.ab_profile(a, b, &options, distance),
        (Operation::Fluss, Request::Fluss { profile, window }) => profiler.fluss(profile, window),
        (operation, request) => Err(ProfileError::RequestMismatch {
            operation: operation.name(),
            request: request.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operation_is_registered() {
        assert_eq!(
            operation_names(),
            vec![
                "MP.ABPROFILE",
                "MP.ATBUCKETINDEX",
                "MP.FLUSS",
                "MP.PROFILE",
                "MP.RPROFILE"
            ]
        );
        for op in Operation::ALL {
            assert_eq!(Operation::lookup(op.name()).unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            Operation::lookup("MP.NOPE"),
            Err(ProfileError::UnknownOperation(ref name)) if name == "MP.NOPE"
        ));
    }

    #[test]
    fn test_mismatched_request() {
        let ts = Series::from_values("x", (0..10).map(|i| i as f64).collect());
        let err = dispatch(
            &Profiler::new(),
            "MP.FLUSS",
            Request::Profile {
                series: &ts,
                options: ProfileOptions::new(3),
                distance: None,
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProfileError::RequestMismatch {
                operation: "MP.FLUSS",
                request: "profile"
            }
        ));
    }
}
