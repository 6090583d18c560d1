//! Choosing one track out of a name search.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::spotify::TrackSummary;

/// How a name search result is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// The provider's top result.
    First,
    /// The n-th result, 1-based (`Nth(4)` is the fourth result).
    Nth(usize),
    /// The result whose title (or "title artist") is closest to the query.
    #[default]
    BestMatch,
}

impl SelectionPolicy {
    /// Pick a track from `candidates` for `query`.
    ///
    /// Returns `None` when there are no candidates or the requested
    /// position does not exist.
    pub fn select<'a>(&self, query: &str, candidates: &'a [TrackSummary]) -> Option<&'a TrackSummary> {
        match self {
            Self::First => candidates.first(),
            Self::Nth(n) => n.checked_sub(1).and_then(|i| candidates.get(i)),
            Self::BestMatch => best_match(query, candidates),
        }
    }
}

fn match_score(query: &str, track: &TrackSummary) -> f64 {
    let name = track.name.to_lowercase();
    let title_only = strsim::normalized_levenshtein(query, &name);
    let with_artists = track
        .artists
        .iter()
        .map(|a| {
            let full = format!("{} {}", name, a.name.to_lowercase());
            strsim::normalized_levenshtein(query, &full)
        })
        .fold(0.0_f64, f64::max);
    title_only.max(with_artists)
}

/// Highest-scoring candidate; earlier results win ties.
fn best_match<'a>(query: &str, candidates: &'a [TrackSummary]) -> Option<&'a TrackSummary> {
    let query = query.trim().to_lowercase();
    let mut best: Option<(&TrackSummary, f64)> = None;
    for track in candidates {
        let score = match_score(&query, track);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((track, score));
        }
    }
    best.map(|(track, _)| track)
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Nth(n) => write!(f, "nth:{}", n),
            Self::BestMatch => f.write_str("best_match"),
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "first" => Ok(Self::First),
            "best_match" | "best-match" => Ok(Self::BestMatch),
            _ => {
                let n = s
                    .strip_prefix("nth:")
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|&n| n > 0)
                    .ok_or_else(|| {
                        format!("invalid selection policy '{s}' (expected first, best_match, or nth:N)")
                    })?;
                Ok(Self::Nth(n))
            }
        }
    }
}

impl Serialize for SelectionPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SelectionPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
