use anyhow::{Context, Result};
use std::path::Path;

use sonority_core::schema::Database;
use sonority_resolve::Config;

/// Replace the stored catalog with the rows of a CSV file.
pub fn import(config: &Config, csv: &Path) -> Result<()> {
    log::info!("Importing catalog from {}", csv.display());

    let mut db = Database::open(&config.catalog_path)
        .with_context(|| format!("Failed to open catalog {}", config.catalog_path.display()))?;
    let import = db
        .import_csv(csv)
        .with_context(|| format!("Failed to import {}", csv.display()))?;

    println!("✓ Imported {} tracks", import.track_count);
    println!("  into {}", config.catalog_path.display());

    Ok(())
}

pub fn show_stats(config: &Config) -> Result<()> {
    let db = Database::open(&config.catalog_path)?;
    let stats = db.stats()?;

    println!("\nSonority Catalog\n");
    println!("  Database: {}", config.catalog_path.display());
    println!("  Tracks: {}", stats.track_count);

    match stats.last_import {
        Some(import) => {
            println!(
                "  Last import: {} ({} tracks, {})",
                import.source,
                import.track_count,
                import.imported_at.format("%Y-%m-%d %H:%M UTC")
            );
        }
        None => {
            println!("\n  Run `sonority catalog import <file.csv>` to load tracks");
        }
    }

    Ok(())
}
