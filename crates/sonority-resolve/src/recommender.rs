//! End-to-end recommendation: resolve the seed, adapt its features, rank
//! the catalog, and sample a presentation subset.

use std::sync::Arc;

use rand::Rng;

use sonority_core::{vector_from_raw_response, Catalog, Error as CoreError, FeatureVector};
use sonority_search::{RankedResult, RankedTrack, SimilarityEngine};

use crate::error::{ResolveError, ResolveResult};
use crate::resolver::FeatureResolver;
use crate::seed::Seed;

/// Default number of tracks shown to the user.
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Recommendation service over a shared, read-only catalog.
#[derive(Debug)]
pub struct Recommender<R> {
    resolver: R,
    catalog: Arc<Catalog>,
    engine: SimilarityEngine,
}

impl<R: FeatureResolver> Recommender<R> {
    pub fn new(resolver: R, catalog: Arc<Catalog>) -> Self {
        Self {
            resolver,
            catalog,
            engine: SimilarityEngine::default(),
        }
    }

    #[must_use]
    pub fn with_engine(mut self, engine: SimilarityEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolve a seed to its canonical feature vector.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NoFeatureData`] when the provider had nothing for the
    /// seed, or the resolver's own error when the lookup failed.
    pub async fn seed_vector(&self, seed: &Seed) -> ResolveResult<FeatureVector> {
        let raw = self.resolver.resolve(seed).await?;
        vector_from_raw_response(&raw).map_err(|e| match e {
            CoreError::NoFeatureData => ResolveError::NoFeatureData {
                seed: seed.to_string(),
            },
            other => ResolveError::Core(other),
        })
    }

    /// Rank the catalog against the seed's features.
    ///
    /// The engine only runs once a real feature vector exists; a seed the
    /// provider cannot describe stops here with
    /// [`ResolveError::NoFeatureData`].
    pub async fn recommend(&self, seed: &Seed) -> ResolveResult<RankedResult> {
        let vector = self.seed_vector(seed).await?;
        log::debug!("Seed '{}' features: {}", seed, vector);

        let ranked = self.engine.recommend(&vector, self.catalog.entries())?;
        log::info!(
            "Ranked {} tracks for '{}' from a catalog of {}",
            ranked.len(),
            seed,
            self.catalog.len()
        );
        Ok(ranked)
    }
}

/// Pick up to `n` distinct tracks uniformly at random, kept in rank order.
///
/// Asking for more tracks than `ranked` holds returns all of them.
pub fn sample<G: Rng + ?Sized>(ranked: &RankedResult, n: usize, rng: &mut G) -> Vec<RankedTrack> {
    let tracks = ranked.tracks();
    let amount = n.min(tracks.len());
    let mut indices = rand::seq::index::sample(rng, tracks.len(), amount).into_vec();
    indices.sort_unstable();
    indices.into_iter().map(|i| tracks[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use sonority_core::{CatalogEntry, RawFeatureResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SEED: [f64; 7] = [0.7, 0.8, 0.05, 0.1, 0.0, 0.6, 120.0];

    #[derive(Debug, Default)]
    struct StubResolver {
        response: RawFeatureResponse,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FeatureResolver for StubResolver {
        async fn resolve(&self, _seed: &Seed) -> ResolveResult<RawFeatureResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    #[derive(Debug)]
    struct FailingResolver;

    #[async_trait]
    impl FeatureResolver for FailingResolver {
        async fn resolve(&self, _seed: &Seed) -> ResolveResult<RawFeatureResponse> {
            Err(ResolveError::RateLimited {
                source_name: "stub".to_string(),
            })
        }
    }

    fn seed_response() -> RawFeatureResponse {
        RawFeatureResponse::from_value(json!({
            "danceability": 0.7, "energy": 0.8, "key": 1, "loudness": -5.0,
            "mode": 1, "speechiness": 0.05, "acousticness": 0.1,
            "instrumentalness": 0.0, "liveness": 0.2, "valence": 0.6,
            "tempo": 120.0, "id": "seed", "duration_ms": 200_000,
            "time_signature": 4
        }))
    }

    fn catalog(n: usize) -> Arc<Catalog> {
        Arc::new(
            (0..n)
                .map(|i| {
                    let step = f64::from(u32::try_from(i).unwrap()) * 0.004;
                    let mut values = SEED;
                    values[0] = 0.5 + step;
                    CatalogEntry::new(format!("t{i}"), format!("Track {i}"), values)
                })
                .collect(),
        )
    }

    fn ranked(n: usize) -> RankedResult {
        let entries: Vec<_> = (0..n)
            .map(|i| CatalogEntry::new(format!("t{i}"), "x", SEED))
            .collect();
        sonority_search::recommend(&FeatureVector::new(SEED), &entries).unwrap()
    }

    #[tokio::test]
    async fn test_recommend_with_stub_resolver() {
        let resolver = StubResolver {
            response: seed_response(),
            ..Default::default()
        };
        let recommender = Recommender::new(resolver, catalog(80));

        let result = recommender.recommend(&Seed::parse("anything")).await.unwrap();
        assert_eq!(result.len(), 50);
        assert_eq!(recommender.resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_response_stops_before_ranking() {
        let recommender = Recommender::new(StubResolver::default(), catalog(10));
        let result = recommender.recommend(&Seed::parse("unknown song")).await;

        match result {
            Err(ResolveError::NoFeatureData { seed }) => assert_eq!(seed, "unknown song"),
            other => panic!("expected NoFeatureData, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolver_errors_propagate() {
        let recommender = Recommender::new(FailingResolver, catalog(10));
        let result = recommender.recommend(&Seed::parse("x")).await;
        assert!(matches!(result, Err(ResolveError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_custom_engine_limit() {
        let resolver = StubResolver {
            response: seed_response(),
            ..Default::default()
        };
        let recommender =
            Recommender::new(resolver, catalog(30)).with_engine(SimilarityEngine::default().with_limit(3));
        let result = recommender.recommend(&Seed::parse("x")).await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(recommender.catalog().len(), 30);
    }

    #[test]
    fn test_sample_respects_size_and_order() {
        let ranked = ranked(50);
        let mut rng = StdRng::seed_from_u64(7);
        let picked = sample(&ranked, DEFAULT_SAMPLE_SIZE, &mut rng);
        assert_eq!(picked.len(), DEFAULT_SAMPLE_SIZE);

        let positions: Vec<usize> = picked
            .iter()
            .map(|t| ranked.iter().position(|r| r.track_id == t.track_id).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sample_more_than_available() {
        let ranked = ranked(4);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample(&ranked, 10, &mut rng).len(), 4);
        assert!(sample(&RankedResult::default(), 10, &mut rng).is_empty());
    }
}
