//! Similarity search for sonority.
//!
//! Given a seed [`FeatureVector`](sonority_core::FeatureVector), the engine
//! prunes the catalog with a per-dimension tolerance band, scores the
//! survivors by cosine similarity, and returns the best matches in
//! descending order.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod band;
pub mod engine;
pub mod error;
pub mod similarity;

pub use band::FeatureBand;
pub use engine::{
    recommend, RankedResult, RankedTrack, SimilarityEngine, NUM_RECOMMENDATIONS,
    SIMILARITY_THRESHOLD,
};
pub use error::{SearchError, SearchResult};
pub use similarity::cosine_similarity;
