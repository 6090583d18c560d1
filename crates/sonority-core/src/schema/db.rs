use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::catalog::{Catalog, CatalogEntry};
use crate::error::{Error, Result};
use crate::features::FeatureVector;

use super::migrations::MIGRATIONS;

/// Record of a completed catalog import.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogImport {
    /// Where the rows came from (usually a CSV path).
    pub source: String,
    pub track_count: usize,
    pub imported_at: DateTime<Utc>,
}

/// Summary of what the store currently holds.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStats {
    pub track_count: usize,
    pub last_import: Option<CatalogImport>,
}

/// A database connection holding the track catalog.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

// Catalog import
impl Database {
    /// Replace the whole catalog with `entries` in a single transaction.
    ///
    /// When a track identifier repeats, the later row's name and features
    /// win but the track keeps the position of its first occurrence, the
    /// same as [`Catalog::from_csv_reader`].
    pub fn replace_catalog(&mut self, entries: &[CatalogEntry], source: &str) -> Result<CatalogImport> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM tracks", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO tracks (
                    track_id, track_name, danceability, energy, speechiness,
                    acousticness, instrumentalness, valence, tempo
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(track_id) DO UPDATE SET
                    track_name = excluded.track_name,
                    danceability = excluded.danceability,
                    energy = excluded.energy,
                    speechiness = excluded.speechiness,
                    acousticness = excluded.acousticness,
                    instrumentalness = excluded.instrumentalness,
                    valence = excluded.valence,
                    tempo = excluded.tempo",
            )?;
            for entry in entries {
                let v = entry.features.values();
                stmt.execute(rusqlite::params![
                    entry.track_id,
                    entry.track_name,
                    v[0],
                    v[1],
                    v[2],
                    v[3],
                    v[4],
                    v[5],
                    v[6],
                ])?;
            }
        }

        let stored: i64 = tx.query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))?;
        let import = CatalogImport {
            source: source.to_string(),
            track_count: usize::try_from(stored).unwrap_or(0),
            imported_at: Utc::now(),
        };
        tx.execute(
            "INSERT INTO catalog_imports (source, track_count, imported_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![import.source, stored, import.imported_at.to_rfc3339()],
        )?;
        tx.commit()?;

        if import.track_count < entries.len() {
            log::warn!(
                "Catalog import from {} collapsed {} duplicate track ids",
                source,
                entries.len() - import.track_count
            );
        }
        log::info!("Imported {} tracks from {}", import.track_count, source);
        Ok(import)
    }

    /// Load a CSV file and replace the stored catalog with its rows.
    pub fn import_csv(&mut self, path: impl AsRef<Path>) -> Result<CatalogImport> {
        let path = path.as_ref();
        let catalog = Catalog::from_csv_path(path)?;
        self.replace_catalog(catalog.entries(), &path.display().to_string())
    }
}

// Catalog queries
impl Database {
    /// Materialize the full catalog in insertion order.
    pub fn load_catalog(&self) -> Result<Catalog> {
        let mut stmt = self.conn.prepare(
            "SELECT track_id, track_name, danceability, energy, speechiness,
                    acousticness, instrumentalness, valence, tempo
             FROM tracks
             ORDER BY rowid",
        )?;

        let entries = stmt
            .query_map([], |row| Self::row_to_entry(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        log::debug!("Loaded {} tracks from database", entries.len());
        Ok(Catalog::new(entries))
    }

    /// Get a single track by identifier.
    pub fn get_track(&self, track_id: &str) -> Result<CatalogEntry> {
        self.conn
            .query_row(
                "SELECT track_id, track_name, danceability, energy, speechiness,
                        acousticness, instrumentalness, valence, tempo
                 FROM tracks
                 WHERE track_id = ?1",
                [track_id],
                |row| Self::row_to_entry(row),
            )
            .optional()?
            .ok_or_else(|| Error::NotFound {
                entity: "track",
                id: track_id.to_string(),
            })
    }

    pub fn track_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// The most recent import, if any.
    pub fn last_import(&self) -> Result<Option<CatalogImport>> {
        let row = self
            .conn
            .query_row(
                "SELECT source, track_count, imported_at
                 FROM catalog_imports
                 ORDER BY id DESC
                 LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((source, track_count, imported_at)) = row else {
            return Ok(None);
        };

        let imported_at = DateTime::parse_from_rfc3339(&imported_at)
            .map_err(|e| Error::InvalidData(format!("bad import timestamp: {e}")))?
            .with_timezone(&Utc);

        Ok(Some(CatalogImport {
            source,
            track_count: usize::try_from(track_count).unwrap_or(0),
            imported_at,
        }))
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        Ok(CatalogStats {
            track_count: self.track_count()?,
            last_import: self.last_import()?,
        })
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<CatalogEntry> {
        Ok(CatalogEntry {
            track_id: row.get(0)?,
            track_name: row.get(1)?,
            features: FeatureVector::new([
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
            ]),
        })
    }
}
