use anyhow::{Context, Result};
use sonority_resolve::{config, Config, SelectionPolicy};
use toml_edit::{value, DocumentMut};

const VALID_KEYS: &str = "spotify_client_id, spotify_client_secret, catalog_path, selection, \
                          sample_size, logging.level, logging.coloured";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn mask(secret: Option<&str>) -> &'static str {
    match secret {
        Some(s) if !s.is_empty() => "<set>",
        _ => "<not set>",
    }
}

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!("  spotify_client_id: {}",
        config.spotify_client_id.as_deref().unwrap_or("<not set>"));
    println!("  spotify_client_secret: {}", mask(config.spotify_client_secret.as_deref()));
    println!("  catalog_path: {}", config.catalog_path.display());
    println!("  selection: {}", config.selection);
    println!("  sample_size: {}", config.sample_size);
    println!("  logging.level: {}", config.logging.level);
    println!("  logging.coloured: {}", config.logging.coloured);

    println!("\nPriority: CLI args > ENV vars (SONO_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value.
pub fn get_config(config: &Config, key: Option<String>) -> Result<()> {
    if let Some(key) = key {
        let shown = match key.as_str() {
            "spotify_client_id" => config
                .spotify_client_id
                .clone()
                .unwrap_or_else(|| String::from("<not set>")),
            "spotify_client_secret" => mask(config.spotify_client_secret.as_deref()).to_string(),
            "catalog_path" => config.catalog_path.display().to_string(),
            "selection" => config.selection.to_string(),
            "sample_size" => config.sample_size.to_string(),
            "logging.level" => config.logging.level.clone(),
            "logging.coloured" => config.logging.coloured.to_string(),
            _ => anyhow::bail!("Unknown config key: {}\n\nValid keys: {}", key, VALID_KEYS),
        };
        println!("{}", shown);
    } else {
        let config_path = config::config_file_path();

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            print!("{}", contents);
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'sonority config init' to create it.");
        }
    }

    Ok(())
}

/// Validate `raw` for `key` and store it in `doc`, keeping comments intact.
fn apply_setting(doc: &mut DocumentMut, key: &str, raw: &str) -> Result<()> {
    match key {
        "spotify_client_id" | "spotify_client_secret" | "catalog_path" => {
            doc[key] = value(raw);
        }
        "selection" => {
            let policy: SelectionPolicy = raw.parse().map_err(anyhow::Error::msg)?;
            doc[key] = value(policy.to_string());
        }
        "sample_size" => {
            let n: i64 = raw
                .parse()
                .with_context(|| format!("sample_size must be a positive integer, got '{}'", raw))?;
            if n < 1 {
                anyhow::bail!("sample_size must be at least 1");
            }
            doc[key] = value(n);
        }
        "logging.level" => {
            let level = raw.to_lowercase();
            if !LOG_LEVELS.contains(&level.as_str()) {
                anyhow::bail!("Unknown log level '{}'; use one of {}", raw, LOG_LEVELS.join(", "));
            }
            logging_table(doc)["level"] = value(level);
        }
        "logging.coloured" => {
            let coloured: bool = raw
                .parse()
                .with_context(|| format!("logging.coloured must be true or false, got '{}'", raw))?;
            logging_table(doc)["coloured"] = value(coloured);
        }
        _ => anyhow::bail!("Unknown config key: {}\n\nValid keys: {}", key, VALID_KEYS),
    }
    Ok(())
}

fn logging_table(doc: &mut DocumentMut) -> &mut toml_edit::Item {
    if !doc.contains_key("logging") {
        doc["logging"] = toml_edit::table();
    }
    &mut doc["logging"]
}

/// Set a config value.
pub fn set_config(key: &str, raw: &str) -> Result<()> {
    let config_path = config::config_file_path();

    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path)
        .context("Failed to read config file")?;
    let mut doc: DocumentMut = contents.parse()
        .context("Config file is not valid TOML")?;

    apply_setting(&mut doc, key, raw)?;

    std::fs::write(&config_path, doc.to_string())
        .context("Failed to write config file")?;

    println!("✓ Updated {} = {}", key, raw);
    println!("  in {}", config_path.display());

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    let config_path = config::config_file_path();
    println!("{}", config_path.display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure sonority.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
