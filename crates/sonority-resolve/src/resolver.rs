//! The seed-resolution seam.

use async_trait::async_trait;
use sonority_core::RawFeatureResponse;

use crate::error::ResolveResult;
use crate::seed::Seed;

/// Turns a [`Seed`] into the provider's raw audio-feature record.
///
/// Implementations return an empty [`RawFeatureResponse`] when the provider
/// has no match for the seed, and an error only when the lookup itself
/// failed. The recommender is generic over this trait so tests can supply
/// canned responses.
#[async_trait]
pub trait FeatureResolver: Send + Sync {
    async fn resolve(&self, seed: &Seed) -> ResolveResult<RawFeatureResponse>;
}
