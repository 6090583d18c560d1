//! Per-dimension tolerance band used to prune the catalog before scoring.
//!
//! For each feature the band spans `round(seed - T, 1)` to
//! `round(seed + T, 1)`, exclusive at both ends. Only the bounds are
//! rounded; catalog values are compared as stored. Tempo shares the same
//! absolute tolerance as the unit-interval features, so in practice its
//! band is a few tenths of a BPM wide.

use sonority_core::features::FEATURE_COUNT;
use sonority_core::{Feature, FeatureVector};

/// Round to one decimal place the way the catalog bands were defined.
///
/// Rounds the exact binary value to the nearest tenth with ties to even,
/// so `0.35` (stored as `0.34999…`) becomes `0.3`. Scaling by ten first
/// would turn it into `3.5` and round up.
#[must_use]
pub fn round_to_tenth(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    format!("{x:.1}").parse().unwrap_or(x)
}

/// Exclusive lower/upper bounds for every feature dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBand {
    lower: [f64; FEATURE_COUNT],
    upper: [f64; FEATURE_COUNT],
}

impl FeatureBand {
    /// Build the band around `seed` with the given absolute tolerance.
    #[must_use]
    pub fn around(seed: &FeatureVector, tolerance: f64) -> Self {
        let mut lower = [0.0; FEATURE_COUNT];
        let mut upper = [0.0; FEATURE_COUNT];
        for (feature, value) in seed.iter() {
            lower[feature.index()] = round_to_tenth(value - tolerance);
            upper[feature.index()] = round_to_tenth(value + tolerance);
        }
        Self { lower, upper }
    }

    /// `(lower, upper)` bounds for one feature.
    #[must_use]
    pub const fn bounds(&self, feature: Feature) -> (f64, f64) {
        (self.lower[feature.index()], self.upper[feature.index()])
    }

    /// Whether every dimension of `candidate` lies strictly inside the band.
    #[must_use]
    pub fn contains(&self, candidate: &FeatureVector) -> bool {
        candidate
            .values()
            .iter()
            .zip(self.lower.iter().zip(&self.upper))
            .all(|(&v, (&lo, &hi))| lo < v && v < hi)
    }
}
