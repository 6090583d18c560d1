use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use sonority_resolve::config::LoggingConfig;
use sonority_resolve::Config;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sonority", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the catalog database (default: ~/.local/share/sonority/catalog.db)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Recommend songs that sound like a seed song
    ///
    /// The seed is either a Spotify track link (anything starting with
    /// https://) or a song name. Names are looked up with Spotify search and
    /// one result is picked according to the `selection` setting.
    ///
    /// The seed's audio features (danceability, energy, speechiness,
    /// acousticness, instrumentalness, valence, tempo) are compared with
    /// every catalog track inside a narrow band around them. The 50 closest
    /// by cosine similarity are kept and a random subset is shown.
    Recommend {
        /// Song name or Spotify track link
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// How many of the top matches to show (default: sample_size setting)
        #[arg(long, short = 'n')]
        sample: Option<usize>,

        /// Show every ranked match in order instead of a random sample
        #[arg(long)]
        all: bool,

        /// Print JSON instead of a list
        #[arg(long)]
        json: bool,

        /// Load the catalog from a CSV file instead of the database
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Manage the track catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, clap::Subcommand)]
enum CatalogCommand {
    /// Replace the catalog with the rows of a CSV file
    ///
    /// The file needs a header row with track_id, track_name, danceability,
    /// energy, speechiness, acousticness, instrumentalness, valence, and
    /// tempo columns. Other columns are ignored.
    Import {
        /// Path to the CSV file
        csv: PathBuf,
    },
    /// Show catalog size and last import
    Stats,
}

#[derive(Debug, clap::Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print one value, or the whole config file
    Get { key: Option<String> },
    /// Set a value in the config file
    Set { key: String, value: String },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

fn init_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose {
        twyg::LogLevel::Debug
    } else {
        match logging.level.to_lowercase().as_str() {
            "trace" => twyg::LogLevel::Trace,
            "debug" => twyg::LogLevel::Debug,
            "warn" => twyg::LogLevel::Warn,
            "error" => twyg::LogLevel::Error,
            _ => twyg::LogLevel::Info,
        }
    };

    let opts = twyg::OptsBuilder::new()
        .coloured(logging.coloured)
        .level(level)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid logging options: {:?}", e))?;
    twyg::setup(opts).map_err(|e| anyhow::anyhow!("Could not set up logging: {:?}", e))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(path) = cli.catalog {
        config.catalog_path = path;
    }

    init_logging(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Recommend {
            query,
            sample,
            all,
            json,
            csv,
        } => {
            let options = commands::recommend::RecommendOptions {
                sample_size: sample.unwrap_or(config.sample_size),
                all,
                json,
                csv,
            };
            commands::run_recommend(&config, &query.join(" "), options).await?;
        }
        Commands::Catalog { command } => {
            // Ensure catalog directory exists
            if let Some(parent) = config.catalog_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            match command {
                CatalogCommand::Import { csv } => commands::catalog::import(&config, &csv)?,
                CatalogCommand::Stats => commands::catalog::show_stats(&config)?,
            }
        }
        Commands::Config { command } => match command {
            ConfigCommand::Show => commands::config::show_config(&config)?,
            ConfigCommand::Get { key } => commands::config::get_config(&config, key)?,
            ConfigCommand::Set { key, value } => commands::config::set_config(&key, &value)?,
            ConfigCommand::Path => commands::config::show_path()?,
            ConfigCommand::Example => commands::config::show_example()?,
            ConfigCommand::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
