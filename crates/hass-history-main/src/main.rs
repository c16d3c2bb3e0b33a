// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of hass-history.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod config;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use config::{AppConfig, TOKEN_ENV_VAR};
use hass_history_client::HistoryClient;
use hass_history_store::HistoryStore;

#[derive(Parser)]
#[command(name = "hass-history")]
#[command(about = "Collect Home Assistant entity history into SQLite", long_about = None)]
struct Cli {
    /// Path to the TOML config file (defaults to ./hass-history.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SQLite database, overriding the config file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and store history for each entity, then print statistics (default)
    Sync {
        /// Entity to fetch; repeat for several. Defaults to the configured list.
        #[arg(short, long = "entity")]
        entities: Vec<String>,
    },
    /// Print stored samples of one entity, newest first
    History {
        entity_id: String,
        /// Maximum number of samples to print
        #[arg(short, long)]
        limit: Option<NonZeroUsize>,
    },
    /// Export the full history of one entity to CSV
    Export {
        entity_id: String,
        /// Output file; a timestamped name in the export directory when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print database statistics and known entities
    Stats,
    /// List entities present in the database
    Entities,
}

fn main() -> Result<()> {
    // Respects RUST_LOG, defaults to info
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set default tracing subscriber")?;

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    let db_path = cli.database.unwrap_or_else(|| config.database.path.clone());
    let store = HistoryStore::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    match cli.command.unwrap_or(Command::Sync {
        entities: Vec::new(),
    }) {
        Command::Sync { entities } => run_sync(&config, store, entities),
        Command::History { entity_id, limit } => print_history(&store, &entity_id, limit),
        Command::Export { entity_id, output } => {
            let path = store
                .export_csv_in(&config.export.directory, &entity_id, output.as_deref())
                .with_context(|| format!("Failed to export {entity_id}"))?;
            println!("Exported {} to {}", entity_id, path.display());
            Ok(())
        }
        Command::Stats => print_summary(&store),
        Command::Entities => {
            for entity_id in store.known_entities()? {
                println!("{entity_id}");
            }
            Ok(())
        }
    }
}

fn run_sync(config: &AppConfig, store: HistoryStore, entities: Vec<String>) -> Result<()> {
    let entities = if entities.is_empty() {
        config.sync.entities.clone()
    } else {
        entities
    };
    if entities.is_empty() {
        bail!("No entities to sync: pass --entity or set sync.entities");
    }

    let client_config = config.client_config(std::env::var(TOKEN_ENV_VAR).ok())?;
    info!(
        "🚀 Syncing {} entities from {}",
        entities.len(),
        client_config.base_url
    );
    let client = HistoryClient::new(client_config, store)?;

    for entity_id in &entities {
        if client.fetch_and_store(entity_id) {
            println!("✓ Successfully processed {entity_id}");
        } else {
            println!("✗ Failed to process {entity_id}");
        }
        println!("{}", "-".repeat(50));
    }

    print_summary(client.store())
}

fn print_summary(store: &HistoryStore) -> Result<()> {
    let stats = store.stats()?;
    println!();
    println!("Database Statistics:");
    println!("Total records: {}", stats.total_records);
    println!("Unique entities: {}", stats.unique_entities);
    println!(
        "Date range: {} to {}",
        stats.earliest_record.as_deref().unwrap_or("-"),
        stats.latest_record.as_deref().unwrap_or("-")
    );

    let entities: Vec<String> = store.known_entities()?.into_iter().collect();
    println!();
    println!("Entities in database: {entities:?}");
    Ok(())
}

fn print_history(store: &HistoryStore, entity_id: &str, limit: Option<NonZeroUsize>) -> Result<()> {
    let samples = store.history(entity_id, limit)?;
    if samples.is_empty() {
        println!("No samples stored for {entity_id}");
        return Ok(());
    }

    println!("{:<32} {:<32} STATE", "LAST UPDATED", "LAST CHANGED");
    for sample in &samples {
        println!(
            "{:<32} {:<32} {}",
            sample.last_updated, sample.last_changed, sample.state
        );
    }
    println!("{} of {} samples", samples.len(), store.count_for(entity_id)?);
    Ok(())
}
