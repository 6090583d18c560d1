//! Error types for seed resolution and the recommendation service.

use thiserror::Error;

/// Errors that can occur while resolving a seed or producing recommendations.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// An HTTP request to an external source failed on the server side.
    #[error("HTTP error from {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
    },

    /// The external source rejected the request (4xx other than 401/404/429).
    #[error("{source_name} rejected request with status {status}")]
    Rejected { source_name: String, status: u16 },

    /// The external source returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited { source_name: String },

    /// The requested entity was not found at the external source.
    #[error("not found: {entity} at {source_name}")]
    NotFound { entity: String, source_name: String },

    /// A response from an external source could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// Client credentials were refused.
    #[error("authentication with {source_name} failed: {message}")]
    Auth {
        source_name: String,
        message: String,
    },

    /// A cached access token stopped being accepted.
    #[error("access token for {source_name} expired")]
    TokenExpired { source_name: String },

    /// No client credentials are configured.
    #[error("missing Spotify client credentials (set spotify_client_id and spotify_client_secret)")]
    MissingCredentials,

    /// A track link did not contain a usable track identifier.
    #[error("invalid track link: {0}")]
    InvalidLink(String),

    /// The provider had no audio features for the seed.
    #[error("no audio feature data for '{seed}'")]
    NoFeatureData { seed: String },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// An error propagated from the core domain layer.
    #[error("core error: {0}")]
    Core(#[from] sonority_core::Error),

    /// An error propagated from the similarity engine.
    #[error("search error: {0}")]
    Search(#[from] sonority_search::SearchError),
}

impl ResolveError {
    /// Returns `true` when the error is transient and the operation may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::RateLimited { .. } | Self::TokenExpired { .. } => true,
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` when the error indicates the entity was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoFeatureData { .. })
    }
}

/// Convenience alias for resolution results.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
