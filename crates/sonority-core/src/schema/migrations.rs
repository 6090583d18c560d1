/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Catalog tracks with their canonical audio features
CREATE TABLE IF NOT EXISTS tracks (
    track_id TEXT PRIMARY KEY,
    track_name TEXT NOT NULL,
    danceability REAL NOT NULL,
    energy REAL NOT NULL,
    speechiness REAL NOT NULL,
    acousticness REAL NOT NULL,
    instrumentalness REAL NOT NULL,
    valence REAL NOT NULL,
    tempo REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tracks_track_name ON tracks(track_name);
"#;

const MIGRATION_002: &str = r#"
-- One row per catalog import
CREATE TABLE IF NOT EXISTS catalog_imports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    track_count INTEGER NOT NULL,
    imported_at TEXT NOT NULL
);
"#;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "tracks",
        sql: MIGRATION_001,
    },
    Migration {
        version: 2,
        name: "catalog_imports",
        sql: MIGRATION_002,
    },
];
