use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use sonority_core::schema::Database;
use sonority_core::Catalog;
use sonority_resolve::{
    sample, Config, Recommender, ResolveError, Seed, SpotifyClient, SpotifyResolver,
};
use sonority_search::RankedTrack;

const TRACK_URL_BASE: &str = "https://open.spotify.com/track/";

#[derive(Debug)]
pub struct RecommendOptions {
    pub sample_size: usize,
    pub all: bool,
    pub json: bool,
    pub csv: Option<PathBuf>,
}

fn load_catalog(config: &Config, csv: Option<&PathBuf>) -> Result<Catalog> {
    if let Some(csv) = csv {
        return Catalog::from_csv_path(csv)
            .with_context(|| format!("Failed to load catalog CSV {}", csv.display()));
    }

    let db = Database::open(&config.catalog_path)
        .with_context(|| format!("Failed to open catalog {}", config.catalog_path.display()))?;
    Ok(db.load_catalog()?)
}

pub async fn run_recommend(config: &Config, query: &str, options: RecommendOptions) -> Result<()> {
    let seed = Seed::parse(query);
    if seed.as_str().is_empty() {
        anyhow::bail!("Empty query: give a song name or a track link");
    }

    let catalog = load_catalog(config, options.csv.as_ref())?;
    if catalog.is_empty() {
        anyhow::bail!(
            "The catalog is empty.\n\nRun 'sonority catalog import <file.csv>' first."
        );
    }
    log::info!("Catalog holds {} tracks", catalog.len());

    let (client_id, client_secret) = config.spotify_credentials()?;
    let client = SpotifyClient::new(client_id, client_secret)?;
    let resolver = SpotifyResolver::new(client, config.selection);
    let recommender = Recommender::new(resolver, Arc::new(catalog));

    let ranked = match recommender.recommend(&seed).await {
        Ok(ranked) => ranked,
        Err(ResolveError::NoFeatureData { .. }) => {
            println!("No audio features found for '{}'", seed);
            return Ok(());
        }
        Err(e) => return Err(anyhow::Error::new(e).context("Recommendation failed")),
    };

    if ranked.is_empty() {
        println!("No catalog tracks are close enough to '{}'", seed);
        return Ok(());
    }

    let shown: Vec<RankedTrack> = if options.all {
        ranked.into_vec()
    } else {
        sample(&ranked, options.sample_size, &mut rand::rng())
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        print_tracks(&seed, &shown);
    }

    Ok(())
}

fn print_tracks(seed: &Seed, tracks: &[RankedTrack]) {
    println!("\nSongs like '{}':\n", seed);
    for (i, track) in tracks.iter().enumerate() {
        println!(
            "  {:>2}. {} ({:.4})\n      {}{}",
            i + 1,
            track.track_name,
            track.score,
            TRACK_URL_BASE,
            track.track_id
        );
    }
}
