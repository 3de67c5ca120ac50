//! # Seed Data Generator
//!
//! Populates the database with development data: one account, a few
//! counterparties, and a product catalog with opening stock.
//!
//! ## Usage
//! ```bash
//! # Default database path (./vendia_dev.db)
//! cargo run -p vendia-db --bin seed
//!
//! # Custom amount / path
//! cargo run -p vendia-db --bin seed -- --count 200 --db ./data/vendia.db
//! ```

use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;

use vendia_core::{TaxClass, DEFAULT_ACCOUNT_ID};
use vendia_db::repository::product::NewProduct;
use vendia_db::{Database, DbConfig};

/// Product categories with name stems for realistic test data.
const CATEGORIES: &[(&str, TaxClass, &[&str])] = &[
    (
        "BEV",
        TaxClass::Rate19,
        &[
            "Cola 330ml", "Cola 1.5L", "Soda Water", "Orange Juice", "Apple Juice", "Iced Tea",
            "Energy Drink", "Lemonade",
        ],
    ),
    (
        "GRO",
        TaxClass::Exempt,
        &[
            "Rice 1kg", "Beans 500g", "Flour 1kg", "Sugar 1kg", "Salt 500g", "Pasta 500g",
            "Eggs Dozen", "Milk 1L",
        ],
    ),
    (
        "HWR",
        TaxClass::Rate19,
        &[
            "Hammer", "Screwdriver Set", "Power Drill", "Tape Measure", "Work Gloves",
            "Extension Cord", "LED Bulb", "Paint 1Gal",
        ],
    ),
    (
        "MED",
        TaxClass::Excluded,
        &["Bandages", "Antiseptic", "Thermometer", "Face Masks"],
    ),
    (
        "BKS",
        TaxClass::Rate5,
        &["Notebook A5", "Notebook A4", "Sketchbook", "Planner"],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 100;
    let mut db_path = String::from("./vendia_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(100);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Vendia Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 100)");
                println!("  -d, --db <PATH>    Database file path (default: ./vendia_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, count, "Seeding development data");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    // Reuse the default account across runs; create it on first run.
    let account = match db.accounts().get(DEFAULT_ACCOUNT_ID).await? {
        Some(account) => account,
        None => db.accounts().create("Dev Shop", "INV", "QUO").await?,
    };
    info!(account_id = account.id, "Using account");

    let existing = db.products().count(account.id).await?;
    if existing > 0 {
        info!(existing, "Account already has products, skipping seed");
        return Ok(());
    }

    db.parties()
        .create_customer(account.id, "Walk-in Customer", None, None)
        .await?;
    db.parties()
        .create_customer(
            account.id,
            "Maria Gonzalez",
            Some("555-0101"),
            Some("maria@example.com"),
        )
        .await?;
    let supplier = db
        .parties()
        .create_supplier(account.id, "Main Distributor", Some("555-0200"), None)
        .await?;

    info!("Counterparties created");

    let mut generated = 0usize;
    let start = std::time::Instant::now();

    'outer: for (category, tax_class, names) in CATEGORIES {
        for (idx, name) in names.iter().enumerate() {
            if generated >= count {
                break 'outer;
            }

            let seed = generated + idx;
            // Price 1.99 - 49.99, deterministic per seed
            let unit_price_cents = 199 + ((seed * 431) % 4_800) as i64;

            let product = db
                .products()
                .create(
                    account.id,
                    NewProduct {
                        sku: format!("{}-{:03}", category, idx + 1),
                        name: (*name).to_string(),
                        unit_price_cents,
                        tax_class: *tax_class,
                        track_stock: true,
                        low_stock_threshold: Some(5),
                    },
                )
                .await?;

            // Opening stock 5-54 units via the stock ledger, so the
            // movement journal starts populated.
            let opening = 5 + (seed % 50) as i64;
            db.ledger()
                .add_stock(
                    account.id,
                    product.id,
                    opening,
                    Some(supplier.id),
                    Some(unit_price_cents * 6 / 10),
                    Some("opening stock"),
                )
                .await?;

            generated += 1;
        }
    }

    info!(
        generated,
        elapsed = ?start.elapsed(),
        "Seed complete"
    );

    Ok(())
}
