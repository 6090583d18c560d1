//! Search error types.

use thiserror::Error;

/// Errors raised by the similarity engine.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The seed vector has zero magnitude, so no direction to compare against.
    #[error("seed feature vector has zero magnitude")]
    DegenerateSeed,
}

/// Convenience alias for search results.
pub type SearchResult<T> = std::result::Result<T, SearchError>;
