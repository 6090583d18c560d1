//! The read-only track catalog.
//!
//! A [`Catalog`] is materialized once (from CSV or from the SQLite store)
//! and then shared by every query. Nothing in sonority mutates it after
//! loading.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::features::{Feature, FeatureVector, FEATURE_COUNT};

/// A candidate track with its precomputed audio features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Opaque provider track identifier (unique within a catalog).
    pub track_id: String,

    /// Display name. Not guaranteed unique.
    pub track_name: String,

    pub features: FeatureVector,
}

impl CatalogEntry {
    #[must_use]
    pub fn new(
        track_id: impl Into<String>,
        track_name: impl Into<String>,
        features: impl Into<FeatureVector>,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            track_name: track_name.into(),
            features: features.into(),
        }
    }
}

/// One row of a catalog CSV file. Columns beyond these are ignored.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    track_id: String,
    track_name: String,
    danceability: f64,
    energy: f64,
    speechiness: f64,
    acousticness: f64,
    instrumentalness: f64,
    valence: f64,
    tempo: f64,
}

impl From<CatalogRow> for CatalogEntry {
    fn from(row: CatalogRow) -> Self {
        let mut values = [0.0; FEATURE_COUNT];
        values[Feature::Danceability.index()] = row.danceability;
        values[Feature::Energy.index()] = row.energy;
        values[Feature::Speechiness.index()] = row.speechiness;
        values[Feature::Acousticness.index()] = row.acousticness;
        values[Feature::Instrumentalness.index()] = row.instrumentalness;
        values[Feature::Valence.index()] = row.valence;
        values[Feature::Tempo.index()] = row.tempo;
        Self {
            track_id: row.track_id,
            track_name: row.track_name,
            features: FeatureVector::new(values),
        }
    }
}

/// An in-memory, read-only collection of [`CatalogEntry`] values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load a catalog from a CSV file with a header row.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading catalog from {}", path.display());
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Load a catalog from any CSV source with a header row.
    ///
    /// Every row must parse; the first malformed row aborts the load.
    /// A repeated track id replaces the earlier row's name and features in
    /// place, so each track sits at its first position.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut entries: Vec<CatalogEntry> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut rows = 0_usize;
        for result in rdr.deserialize() {
            let row: CatalogRow = result?;
            let entry = CatalogEntry::from(row);
            rows += 1;
            if let Some(&i) = positions.get(&entry.track_id) {
                entries[i] = entry;
            } else {
                positions.insert(entry.track_id.clone(), entries.len());
                entries.push(entry);
            }
        }
        if rows > entries.len() {
            log::warn!("Collapsed {} duplicate catalog track ids", rows - entries.len());
        }
        log::debug!("Parsed {} catalog rows", rows);
        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    /// Find an entry by track identifier.
    #[must_use]
    pub fn get(&self, track_id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.track_id == track_id)
    }
}

impl AsRef<[CatalogEntry]> for Catalog {
    fn as_ref(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;

    const CSV: &str = "\
track_id,track_name,artist_name,danceability,energy,key,speechiness,acousticness,instrumentalness,valence,tempo
0DW5anNzTO7h0OlKqFsVQ6,Song One,Artist A,0.7,0.8,5,0.05,0.1,0.0,0.6,120.0
1aBcDeFgHiJkLmNoPqRsTu,Song Two,Artist B,0.3,0.4,2,0.2,0.9,0.5,0.1,80.5
";

    #[test]
    fn test_from_csv_reader_selects_named_columns() {
        let catalog = Catalog::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);

        let first = &catalog.entries()[0];
        assert_eq!(first.track_id, "0DW5anNzTO7h0OlKqFsVQ6");
        assert_eq!(first.track_name, "Song One");
        assert_eq!(
            first.features.values(),
            &[0.7, 0.8, 0.05, 0.1, 0.0, 0.6, 120.0]
        );
    }

    #[test]
    fn test_from_csv_reader_rejects_bad_row() {
        let bad = "track_id,track_name,danceability,energy,speechiness,acousticness,instrumentalness,valence,tempo\n\
                   x,Name,not-a-number,0.1,0.1,0.1,0.1,0.1,100\n";
        let result = Catalog::from_csv_reader(bad.as_bytes());
        assert!(matches!(result, Err(Error::Csv(_))));
    }

    #[test]
    fn test_from_csv_reader_collapses_repeated_ids() {
        let csv = "track_id,track_name,danceability,energy,speechiness,acousticness,instrumentalness,valence,tempo\n\
                   a,Old Name,0.1,0.1,0.1,0.1,0.1,0.1,100\n\
                   b,Bee,0.2,0.2,0.2,0.2,0.2,0.2,100\n\
                   a,New Name,0.3,0.3,0.3,0.3,0.3,0.3,100\n";
        let catalog = Catalog::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].track_id, "a");
        assert_eq!(catalog.entries()[0].track_name, "New Name");
        assert_eq!(catalog.entries()[1].track_id, "b");
    }

    #[test]
    fn test_from_csv_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let catalog = Catalog::from_csv_path(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("1aBcDeFgHiJkLmNoPqRsTu").is_some());
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_from_csv_path_missing_file() {
        let result = Catalog::from_csv_path("/nonexistent/catalog.csv");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_empty_catalog() {
        let header_only = "track_id,track_name,danceability,energy,speechiness,acousticness,instrumentalness,valence,tempo\n";
        let catalog = Catalog::from_csv_reader(header_only.as_bytes()).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.iter().count(), 0);
    }

    #[test]
    fn test_collect_into_catalog() {
        let catalog: Catalog = (0..3)
            .map(|i| CatalogEntry::new(format!("id-{i}"), "name", [0.5; 7]))
            .collect();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.as_ref()[2].track_id, "id-2");
    }
}
