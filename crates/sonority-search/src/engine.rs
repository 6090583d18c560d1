//! Band-filtered cosine ranking.
//!
//! A query runs in three steps over an in-memory catalog slice:
//!
//! 1. keep entries inside the [`FeatureBand`] around the seed,
//! 2. score each survivor by cosine similarity to the seed,
//! 3. sort descending (stable, so ties keep catalog order) and keep the
//!    top [`NUM_RECOMMENDATIONS`].
//!
//! The engine holds no state between calls and never mutates the catalog,
//! so one catalog can serve any number of concurrent queries.

use serde::{Deserialize, Serialize};
use sonority_core::{CatalogEntry, FeatureVector};

use crate::band::FeatureBand;
use crate::error::{SearchError, SearchResult};
use crate::similarity::{cosine_with_norm, norm};

/// Absolute per-dimension tolerance of the candidate band.
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

/// Maximum number of ranked tracks returned per query.
pub const NUM_RECOMMENDATIONS: usize = 50;

/// One scored recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTrack {
    pub track_id: String,
    pub track_name: String,
    /// Cosine similarity to the seed, in [-1, 1].
    pub score: f64,
}

/// Recommendations ordered by descending score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedResult {
    tracks: Vec<RankedTrack>,
}

impl RankedResult {
    #[must_use]
    pub fn tracks(&self) -> &[RankedTrack] {
        &self.tracks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedTrack> {
        self.tracks.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<RankedTrack> {
        self.tracks
    }
}

impl IntoIterator for RankedResult {
    type Item = RankedTrack;
    type IntoIter = std::vec::IntoIter<RankedTrack>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.into_iter()
    }
}

impl<'a> IntoIterator for &'a RankedResult {
    type Item = &'a RankedTrack;
    type IntoIter = std::slice::Iter<'a, RankedTrack>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

/// Similarity search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityEngine {
    tolerance: f64,
    limit: usize,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self {
            tolerance: SIMILARITY_THRESHOLD,
            limit: NUM_RECOMMENDATIONS,
        }
    }
}

impl SimilarityEngine {
    #[must_use]
    pub const fn new(tolerance: f64, limit: usize) -> Self {
        Self { tolerance, limit }
    }

    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Catalog entries inside the tolerance band around `seed`, in catalog order.
    pub fn candidates<'a>(
        &self,
        seed: &FeatureVector,
        catalog: &'a [CatalogEntry],
    ) -> Vec<&'a CatalogEntry> {
        let band = FeatureBand::around(seed, self.tolerance);
        catalog
            .iter()
            .filter(|entry| band.contains(&entry.features))
            .collect()
    }

    /// Rank catalog entries by similarity to `seed`.
    ///
    /// Candidates with a zero-magnitude feature vector cannot be scored and
    /// are left out. An empty band yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::DegenerateSeed`] when the seed vector has zero
    /// (or non-finite) magnitude.
    pub fn recommend(
        &self,
        seed: &FeatureVector,
        catalog: &[CatalogEntry],
    ) -> SearchResult<RankedResult> {
        let seed_values = seed.values();
        let seed_norm = norm(seed_values);
        if seed_norm <= 0.0 || !seed_norm.is_finite() {
            log::warn!("Refusing to rank against degenerate seed: {}", seed);
            return Err(SearchError::DegenerateSeed);
        }

        let candidates = self.candidates(seed, catalog);
        log::debug!(
            "{} of {} catalog entries inside band (tolerance {})",
            candidates.len(),
            catalog.len(),
            self.tolerance
        );

        let mut scored: Vec<(&CatalogEntry, f64)> = candidates
            .into_iter()
            .filter_map(|entry| {
                match cosine_with_norm(seed_values, seed_norm, entry.features.values()) {
                    Some(score) => Some((entry, score)),
                    None => {
                        log::debug!("Skipping {}: degenerate feature vector", entry.track_id);
                        None
                    }
                }
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.limit);

        let tracks = scored
            .into_iter()
            .map(|(entry, score)| RankedTrack {
                track_id: entry.track_id.clone(),
                track_name: entry.track_name.clone(),
                score,
            })
            .collect();

        Ok(RankedResult { tracks })
    }
}

/// Rank `catalog` against `seed` with the default tolerance and limit.
///
/// # Errors
///
/// See [`SimilarityEngine::recommend`].
pub fn recommend(seed: &FeatureVector, catalog: &[CatalogEntry]) -> SearchResult<RankedResult> {
    SimilarityEngine::default().recommend(seed, catalog)
}
