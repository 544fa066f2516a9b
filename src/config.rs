//! Options and size limits.
//!
//! Size limits come in three tiers; the most specific one wins:
//! built-in default, then the configured value (`mp.profile.maxsize`,
//! `mp.abprofile.maxsize`), then a per-caller capability
//! (`mp.profile.maxsize.capname`, `mp.abprofile.maxsize.capname`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::matrix_profile::StatsStrategy;
use crate::error::{ProfileError, Result};

/// Default limit on the length of a series passed to a self-join or row profile.
pub const DEFAULT_PROFILE_MAXSIZE: usize = 50_000;
/// Default limit on the length of either series of an AB-join.
pub const DEFAULT_ABPROFILE_MAXSIZE: usize = 10_000;

pub const CONFIG_PROFILE_MAXSIZE: &str = "mp.profile.maxsize";
pub const CONFIG_ABPROFILE_MAXSIZE: &str = "mp.abprofile.maxsize";
pub const CAPNAME_PROFILE_MAXSIZE: &str = "mp.profile.maxsize.capname";
pub const CAPNAME_ABPROFILE_MAXSIZE: &str = "mp.abprofile.maxsize.capname";

fn default_profile_maxsize() -> usize {
    DEFAULT_PROFILE_MAXSIZE
}

fn default_abprofile_maxsize() -> usize {
    DEFAULT_ABPROFILE_MAXSIZE
}

/// Maximum series lengths accepted before any work is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimits {
    /// Self-join and row profile.
    #[serde(rename = "mp.profile.maxsize", default = "default_profile_maxsize")]
    pub profile: usize,
    /// Each series of an AB-join.
    #[serde(rename = "mp.abprofile.maxsize", default = "default_abprofile_maxsize")]
    pub ab_profile: usize,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE_MAXSIZE,
            ab_profile: DEFAULT_ABPROFILE_MAXSIZE,
        }
    }
}

fn parse_limit(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| ProfileError::InvalidLimit {
            key: key.to_string(),
            value: value.to_string(),
        })
}

impl SizeLimits {
    /// Read configured limits from a flat property map. Missing keys keep
    /// their default; unrelated keys are ignored.
    pub fn from_properties<'a, I>(properties: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut limits = Self::default();
        for (key, value) in properties {
            match key {
                CONFIG_PROFILE_MAXSIZE => limits.profile = parse_limit(key, value)?,
                CONFIG_ABPROFILE_MAXSIZE => limits.ab_profile = parse_limit(key, value)?,
                _ => {}
            }
        }
        Ok(limits)
    }

    /// Apply capability overrides on top of these limits.
    pub fn resolve(&self, capabilities: &Capabilities) -> Result<Self> {
        let mut resolved = *self;
        if let Some(v) = capabilities.get(CAPNAME_PROFILE_MAXSIZE) {
            resolved.profile = parse_limit(CAPNAME_PROFILE_MAXSIZE, v)?;
        }
        if let Some(v) = capabilities.get(CAPNAME_ABPROFILE_MAXSIZE) {
            resolved.ab_profile = parse_limit(CAPNAME_ABPROFILE_MAXSIZE, v)?;
        }
        Ok(resolved)
    }
}

/// Per-caller capability grants, as opaque name/value strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(BTreeMap<String, String>);

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parameters shared by the profiling operations.
///
/// `exclusion_radius` is signed so that a negative value coming from an
/// untyped source is reported as an error instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileOptions {
    /// Subsequence length `k`.
    pub subsequence_length: usize,
    /// Defaults to `ceil(k / 4)` when absent.
    #[serde(default)]
    pub exclusion_radius: Option<i64>,
    /// Report second-nearest neighbors (self-join only).
    #[serde(default)]
    pub robust: bool,
    #[serde(default)]
    pub stats: StatsStrategy,
}

impl ProfileOptions {
    pub fn new(subsequence_length: usize) -> Self {
        Self {
            subsequence_length,
            exclusion_radius: None,
            robust: false,
            stats: StatsStrategy::default(),
        }
    }

    pub fn with_exclusion_radius(mut self, r: i64) -> Self {
        self.exclusion_radius = Some(r);
        self
    }

    pub fn with_robust(mut self, robust: bool) -> Self {
        self.robust = robust;
        self
    }

    pub fn with_stats(mut self, stats: StatsStrategy) -> Self {
        self.stats = stats;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = SizeLimits::default();
        assert_eq!(limits.profile, 50_000);
        assert_eq!(limits.ab_profile, 10_000);
    }

    #[test]
    fn test_tiers_most_specific_wins() {
        let configured =
            SizeLimits::from_properties([(CONFIG_PROFILE_MAXSIZE, "100"), ("other.key", "x")])
                .unwrap();
        assert_eq!(configured.profile, 100);
        assert_eq!(configured.ab_profile, DEFAULT_ABPROFILE_MAXSIZE);

        let caps = Capabilities::new().with(CAPNAME_PROFILE_MAXSIZE, "250");
        let resolved = configured.resolve(&caps).unwrap();
        assert_eq!(resolved.profile, 250);
        assert_eq!(resolved.ab_profile, DEFAULT_ABPROFILE_MAXSIZE);

        let resolved = configured.resolve(&Capabilities::new()).unwrap();
        assert_eq!(resolved, configured);
    }

    #[test]
    fn test_invalid_limits_are_errors() {
        let err = SizeLimits::from_properties([(CONFIG_ABPROFILE_MAXSIZE, "-5")]).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidLimit { ref key, .. } if key == CONFIG_ABPROFILE_MAXSIZE));

        let caps = Capabilities::new().with(CAPNAME_ABPROFILE_MAXSIZE, "lots");
        assert!(SizeLimits::default().resolve(&caps).is_err());
    }
}
