//! Canonical audio-feature schema and the adapter that builds a
//! [`FeatureVector`] from a raw provider response.
//!
//! Providers return a loosely keyed record per track (the Spotify
//! audio-features object carries fourteen attributes plus link fields).
//! Only seven of them take part in similarity comparison. They are
//! selected by name through [`Feature::ALL`], so a provider that adds or
//! reorders attributes cannot shift a value into the wrong slot.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Index;

use crate::error::{Error, Result};

/// Number of dimensions in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 7;

/// One dimension of the canonical feature vector.
///
/// The discriminant is the dimension's position in the vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Danceability = 0,
    Energy = 1,
    Speechiness = 2,
    Acousticness = 3,
    Instrumentalness = 4,
    Valence = 5,
    /// Beats per minute. Not normalized to [0, 1].
    Tempo = 6,
}

impl Feature {
    /// All features in canonical order.
    pub const ALL: [Self; FEATURE_COUNT] = [
        Self::Danceability,
        Self::Energy,
        Self::Speechiness,
        Self::Acousticness,
        Self::Instrumentalness,
        Self::Valence,
        Self::Tempo,
    ];

    /// The attribute name used by providers and catalog columns.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Danceability => "danceability",
            Self::Energy => "energy",
            Self::Speechiness => "speechiness",
            Self::Acousticness => "acousticness",
            Self::Instrumentalness => "instrumentalness",
            Self::Valence => "valence",
            Self::Tempo => "tempo",
        }
    }

    /// Position of this feature in a [`FeatureVector`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The seven audio features of a track in canonical order.
///
/// Values are stored exactly as the provider reported them; nothing is
/// clamped or range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    #[must_use]
    pub const fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    #[must_use]
    pub const fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    #[must_use]
    pub const fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    /// Iterate `(feature, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.iter().map(move |&f| (f, self.get(f)))
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self::new(values)
    }
}

impl Index<Feature> for FeatureVector {
    type Output = f64;

    fn index(&self, feature: Feature) -> &f64 {
        &self.0[feature.index()]
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (feature, value) in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{}={:.3}", feature, value)?;
        }
        Ok(())
    }
}

/// A single track's attributes as returned by a feature provider.
///
/// Kept as an open JSON object so extra or reordered attributes never
/// affect extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFeatureResponse(Map<String, Value>);

impl RawFeatureResponse {
    /// An empty response, meaning the provider found nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a response from an arbitrary JSON value.
    ///
    /// Anything other than an object (including `null`, which the provider
    /// returns for unknown tracks) yields an empty response.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::empty(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The provider's track identifier, when present.
    #[must_use]
    pub fn track_id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for RawFeatureResponse {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Extract the canonical [`FeatureVector`] from a raw provider response.
///
/// Returns [`Error::NoFeatureData`] when the response is empty or any of
/// the seven canonical attributes is missing or not numeric.
pub fn vector_from_raw_response(raw: &RawFeatureResponse) -> Result<FeatureVector> {
    if raw.is_empty() {
        log::debug!("Raw feature response is empty");
        return Err(Error::NoFeatureData);
    }

    let mut values = [0.0; FEATURE_COUNT];
    for feature in Feature::ALL {
        let value = raw.get(feature.name()).and_then(Value::as_f64);
        match value {
            Some(v) => values[feature.index()] = v,
            None => {
                log::debug!(
                    "Raw feature response for {} lacks numeric '{}'",
                    raw.track_id().unwrap_or("<unknown>"),
                    feature
                );
                return Err(Error::NoFeatureData);
            }
        }
    }

    Ok(FeatureVector::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spotify_response() -> RawFeatureResponse {
        RawFeatureResponse::from_value(json!({
            "danceability": 0.735,
            "energy": 0.578,
            "key": 5,
            "loudness": -11.84,
            "mode": 0,
            "speechiness": 0.0461,
            "acousticness": 0.514,
            "instrumentalness": 0.0902,
            "liveness": 0.159,
            "valence": 0.636,
            "tempo": 98.002,
            "type": "audio_features",
            "id": "06AKEBrKUckW0KREUWRnvT",
            "uri": "spotify:track:06AKEBrKUckW0KREUWRnvT",
            "track_href": "https://api.spotify.com/v1/tracks/06AKEBrKUckW0KREUWRnvT",
            "analysis_url": "https://api.spotify.com/v1/audio-analysis/06AKEBrKUckW0KREUWRnvT",
            "duration_ms": 255349,
            "time_signature": 4
        }))
    }

    #[test]
    fn test_feature_order_matches_index() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
        }
        assert_eq!(Feature::Tempo.name(), "tempo");
    }

    #[test]
    fn test_vector_from_full_response() {
        let vector = vector_from_raw_response(&spotify_response()).unwrap();
        assert_eq!(
            vector.values(),
            &[0.735, 0.578, 0.0461, 0.514, 0.0902, 0.636, 98.002]
        );
        assert_eq!(vector[Feature::Valence], 0.636);
    }

    #[test]
    fn test_vector_ignores_key_order_and_extra_fields() {
        let raw = RawFeatureResponse::from_value(json!({
            "tempo": 120.0,
            "extra_attribute": 42,
            "valence": 0.6,
            "instrumentalness": 0,
            "acousticness": 0.1,
            "speechiness": 0.05,
            "energy": 0.8,
            "danceability": 0.7
        }));
        let vector = vector_from_raw_response(&raw).unwrap();
        assert_eq!(vector.values(), &[0.7, 0.8, 0.05, 0.1, 0.0, 0.6, 120.0]);
    }

    #[test]
    fn test_empty_response_is_no_feature_data() {
        let result = vector_from_raw_response(&RawFeatureResponse::empty());
        assert!(matches!(result, Err(Error::NoFeatureData)));
    }

    #[test]
    fn test_null_response_is_no_feature_data() {
        let raw = RawFeatureResponse::from_value(Value::Null);
        assert!(raw.is_empty());
        assert!(matches!(
            vector_from_raw_response(&raw),
            Err(Error::NoFeatureData)
        ));
    }

    #[test]
    fn test_missing_attribute_is_no_feature_data() {
        let raw = RawFeatureResponse::from_value(json!({
            "danceability": 0.7,
            "energy": 0.8,
            "id": "abc"
        }));
        assert!(matches!(
            vector_from_raw_response(&raw),
            Err(Error::NoFeatureData)
        ));
    }

    #[test]
    fn test_out_of_range_values_pass_through() {
        let raw = RawFeatureResponse::from_value(json!({
            "danceability": 1.7,
            "energy": -0.2,
            "speechiness": 0.0,
            "acousticness": 0.0,
            "instrumentalness": 0.0,
            "valence": 3.0,
            "tempo": -5.0
        }));
        let vector = vector_from_raw_response(&raw).unwrap();
        assert_eq!(vector[Feature::Danceability], 1.7);
        assert_eq!(vector[Feature::Energy], -0.2);
        assert_eq!(vector[Feature::Tempo], -5.0);
    }

    #[test]
    fn test_track_id() {
        assert_eq!(
            spotify_response().track_id(),
            Some("06AKEBrKUckW0KREUWRnvT")
        );
        assert_eq!(RawFeatureResponse::empty().track_id(), None);
    }

    #[test]
    fn test_vector_display() {
        let vector = FeatureVector::new([0.7, 0.8, 0.05, 0.1, 0.0, 0.6, 120.0]);
        let display = vector.to_string();
        assert!(display.starts_with("danceability=0.700 energy=0.800"));
        assert!(display.ends_with("tempo=120.000"));
    }
}
