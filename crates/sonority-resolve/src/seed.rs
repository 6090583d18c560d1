//! The song a query is anchored on.

use std::fmt;

use crate::error::{ResolveError, ResolveResult};

/// A user-supplied seed: either a free-text song name or a track link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Seed {
    /// Song title (optionally with artist) to search for.
    Name(String),
    /// Track link such as `https://open.spotify.com/track/<id>?si=...`.
    Link(String),
}

impl Seed {
    /// Classify a raw query. Anything starting with `https://` is a link.
    pub fn parse(query: &str) -> Self {
        let query = query.trim();
        if query.starts_with("https://") {
            Self::Link(query.to_string())
        } else {
            Self::Name(query.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Name(s) | Self::Link(s) => s,
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extract the track identifier from a track link.
///
/// The identifier is the final path segment with any query string removed.
/// Provider identifiers are alphanumeric; anything else is rejected so it
/// can never alter the request path.
pub fn track_id_from_link(link: &str) -> ResolveResult<String> {
    let last_segment = link.rsplit('/').next().unwrap_or_default();
    let id = last_segment.split('?').next().unwrap_or_default();

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ResolveError::InvalidLink(link.to_string()));
    }

    Ok(id.to_string())
}
