//! # Seed Data Writer
//!
//! Writes the default bar stock, staff and settings into a fresh store.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by the config (or the platform default)
//! cargo run -p taproom-db --bin seed
//!
//! # Specify database path
//! cargo run -p taproom-db --bin seed -- --db ./data/taproom.db
//!
//! # Use a specific config file
//! cargo run -p taproom-db --bin seed -- --config ./taproom.toml
//! ```
//!
//! ## Seeded Collections
//! - products: two bottled beers and one spirit drum with four pour sizes
//! - employees: one admin, one cashier
//! - settings: the global settings document, with VAT from `[sales]`
//!
//! A collection that already holds documents is left untouched.

use std::env;
use std::path::PathBuf;
use taproom_core::{AppSettings, Employee, Entity, Product, SeedData};
use taproom_db::{init_tracing, AppConfig, Database, Repository};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Taproom POS Seed Data Writer");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (overrides config)");
                println!("  -c, --config <PATH>   Config file path");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = AppConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = Some(path);
    }
    init_tracing(config.log_filter());

    let path = config.database_path();
    info!(
        db = %path.display(),
        vat_rate_bps = config.sales.vat_rate_bps,
        filter = config.log_filter(),
        "Configuration loaded"
    );
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    println!("🌱 Taproom POS Seed Data Writer");
    println!("==============================");
    println!("Database: {}", path.display());
    println!();

    let db = Database::new(config.to_db_config()).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");
    println!();

    // A fresh store takes its VAT from the config.
    let mut seed = SeedData::default();
    seed.settings.vat_rate_bps = config.sales.vat_rate_bps;
    seed_collection::<Product>(&db.repo(), &seed.products).await?;
    seed_collection::<Employee>(&db.repo(), &seed.employees).await?;
    seed_collection::<AppSettings>(&db.repo(), std::slice::from_ref(&seed.settings)).await?;

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Writes `defaults` in one batch when the collection is empty.
async fn seed_collection<T: Entity>(
    repo: &Repository<T>,
    defaults: &[T],
) -> Result<(), Box<dyn std::error::Error>> {
    let existing = repo.count().await?;
    if existing > 0 {
        println!("⚠ {} already has {} documents, skipping", T::COLLECTION, existing);
        return Ok(());
    }

    repo.put_batch(defaults).await?;
    println!("✓ {}: {} documents", T::COLLECTION, defaults.len());
    Ok(())
}
