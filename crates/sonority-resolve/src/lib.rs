//! Seed resolution and the recommendation service for sonority.
//!
//! Resolves a seed song (by name or track link) to its raw audio features
//! through the Spotify Web API, then feeds the canonical vector to the
//! similarity engine over a shared catalog.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod recommender;
pub mod resilience;
pub mod resolver;
pub mod seed;
pub mod selection;
pub mod spotify;

pub use config::Config;
pub use error::{ResolveError, ResolveResult};
pub use recommender::{sample, Recommender, DEFAULT_SAMPLE_SIZE};
pub use resolver::FeatureResolver;
pub use seed::{track_id_from_link, Seed};
pub use selection::SelectionPolicy;
pub use spotify::{SpotifyClient, SpotifyResolver, TrackSummary};
