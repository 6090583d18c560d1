//! Integration tests for the catalog import → resolve → rank → sample flow.
//!
//! The seed resolver is stubbed so no Spotify credentials or network access
//! are needed.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tempfile::TempDir;

use sonority_core::schema::Database;
use sonority_core::RawFeatureResponse;
use sonority_resolve::{sample, FeatureResolver, Recommender, ResolveError, ResolveResult, Seed};

const HEADER: &str = "track_id,track_name,artist,danceability,energy,speechiness,\
                      acousticness,instrumentalness,valence,tempo";

/// Resolver answering from a fixed table of seed strings.
#[derive(Debug, Default)]
struct TableResolver {
    table: HashMap<String, RawFeatureResponse>,
}

impl TableResolver {
    fn with(mut self, seed: &str, response: serde_json::Value) -> Self {
        self.table
            .insert(seed.to_string(), RawFeatureResponse::from_value(response));
        self
    }
}

#[async_trait]
impl FeatureResolver for TableResolver {
    async fn resolve(&self, seed: &Seed) -> ResolveResult<RawFeatureResponse> {
        Ok(self.table.get(seed.as_str()).cloned().unwrap_or_default())
    }
}

fn write_catalog(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("tracks.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{HEADER}").unwrap();
    // Inside the band around the seed below.
    writeln!(file, "near,Near Match,A,0.72,0.79,0.06,0.12,0.01,0.61,120.1").unwrap();
    writeln!(file, "exact,Exact Match,B,0.7,0.8,0.05,0.1,0.0,0.6,120.0").unwrap();
    writeln!(file, "loose,Loose Match,C,0.5,0.95,0.2,0.3,0.2,0.8,119.9").unwrap();
    // Outside the band on one dimension each.
    writeln!(file, "slow,Too Slow,D,0.7,0.8,0.05,0.1,0.0,0.6,119.7").unwrap();
    writeln!(file, "calm,Too Calm,E,0.7,0.4,0.05,0.1,0.0,0.6,120.0").unwrap();
    writeln!(file, "edge,On The Edge,F,0.4,0.8,0.05,0.1,0.0,0.6,120.0").unwrap();
    path
}

fn seed_features() -> serde_json::Value {
    json!({
        "danceability": 0.7, "energy": 0.8, "key": 5, "loudness": -6.1,
        "mode": 1, "speechiness": 0.05, "acousticness": 0.1,
        "instrumentalness": 0.0, "liveness": 0.11, "valence": 0.6,
        "tempo": 120.0, "type": "audio_features", "id": "seedid",
        "duration_ms": 215_000, "time_signature": 4
    })
}

#[tokio::test]
async fn test_recommend_from_imported_catalog() {
    let dir = TempDir::new().unwrap();
    let csv = write_catalog(&dir);

    let mut db = Database::open(dir.path().join("catalog.db")).unwrap();
    let import = db.import_csv(&csv).unwrap();
    assert_eq!(import.track_count, 6);

    let catalog = Arc::new(db.load_catalog().unwrap());
    let resolver = TableResolver::default().with("Some Song", seed_features());
    let recommender = Recommender::new(resolver, catalog);

    let ranked = recommender.recommend(&Seed::parse("Some Song")).await.unwrap();
    let ids: Vec<&str> = ranked.iter().map(|t| t.track_id.as_str()).collect();

    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], "exact");
    assert!(ids.contains(&"near"));
    assert!(ids.contains(&"loose"));
    assert!(ranked
        .iter()
        .zip(ranked.iter().skip(1))
        .all(|(a, b)| a.score >= b.score));
    assert!((ranked.tracks()[0].score - 1.0).abs() < 1e-12);
}

#[tokio::test]
async fn test_link_seed_is_passed_through() {
    let dir = TempDir::new().unwrap();
    let csv = write_catalog(&dir);
    let catalog = Arc::new(sonority_core::Catalog::from_csv_path(&csv).unwrap());

    let link = "https://open.spotify.com/track/seedid?si=abc";
    let resolver = TableResolver::default().with(link, seed_features());
    let recommender = Recommender::new(resolver, catalog);

    let seed = Seed::parse(link);
    assert!(matches!(seed, Seed::Link(_)));
    let ranked = recommender.recommend(&seed).await.unwrap();
    assert_eq!(ranked.len(), 3);
}

#[tokio::test]
async fn test_unknown_seed_reports_no_feature_data() {
    let dir = TempDir::new().unwrap();
    let csv = write_catalog(&dir);
    let catalog = Arc::new(sonority_core::Catalog::from_csv_path(&csv).unwrap());
    let recommender = Recommender::new(TableResolver::default(), catalog);

    let err = recommender
        .recommend(&Seed::parse("Nobody Knows This"))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::NoFeatureData { .. }));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_sample_of_ranked_result() {
    let dir = TempDir::new().unwrap();
    let csv = write_catalog(&dir);
    let catalog = Arc::new(sonority_core::Catalog::from_csv_path(&csv).unwrap());
    let resolver = TableResolver::default().with("Some Song", seed_features());
    let recommender = Recommender::new(resolver, catalog);

    let ranked = recommender.recommend(&Seed::parse("Some Song")).await.unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    let two = sample(&ranked, 2, &mut rng);
    assert_eq!(two.len(), 2);
    assert!(two.iter().all(|t| ranked.iter().any(|r| r == t)));

    let all = sample(&ranked, 10, &mut rng);
    assert_eq!(all, ranked.tracks().to_vec());
}

#[test]
fn test_reimport_replaces_catalog() {
    let dir = TempDir::new().unwrap();
    let csv = write_catalog(&dir);
    let mut db = Database::open(dir.path().join("catalog.db")).unwrap();
    db.import_csv(&csv).unwrap();

    let small = dir.path().join("small.csv");
    std::fs::write(
        &small,
        format!("{HEADER}\nonly,Only One,Z,0.5,0.5,0.5,0.5,0.5,0.5,100.0\n"),
    )
    .unwrap();
    db.import_csv(&small).unwrap();

    let stats = db.stats().unwrap();
    assert_eq!(stats.track_count, 1);
    assert_eq!(stats.last_import.unwrap().track_count, 1);
    assert_eq!(db.load_catalog().unwrap().len(), 1);
}
