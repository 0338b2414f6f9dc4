//! # Seed Data Generator
//!
//! Fills one tenant's catalog with demo products for development.
//!
//! ## Usage
//! ```bash
//! # 200 products for worker "demo" (defaults)
//! cargo run -p stockroom-db --bin seed
//!
//! # Custom tenant and amount
//! cargo run -p stockroom-db --bin seed -- --tenant anna --count 500
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! The tenant's worker account is not created here; provision it through
//! `POST /api/admin/workers` so it gets a real password hash.
//!
//! ## Generated Products
//! - Categories: drinks, snacks, stationery, household
//! - Barcode: `590{tenant-local index:010}` (EAN-13 shaped, checksum not valid)
//! - QR code on every third product: `QR-{CATEGORY}-{index}`
//! - Stock: 0 - 50

use std::env;
use stockroom_core::{NewProduct, TenantId};
use stockroom_db::{Database, DbConfig};

const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "drinks",
        &[
            "Cola", "Lemonade", "Mineral Water", "Orange Juice", "Apple Juice", "Iced Tea", "Cold Brew",
            "Energy Drink",
        ],
    ),
    (
        "snacks",
        &[
            "Salted Crisps", "Pretzels", "Chocolate Bar", "Gummy Bears", "Oat Cookies", "Peanuts",
            "Rice Crackers",
        ],
    ),
    (
        "stationery",
        &[
            "Pencil HB", "Ballpoint Pen", "Notebook A5", "Notebook A4", "Eraser", "Ruler 30cm", "Glue Stick",
            "Sticky Notes",
        ],
    ),
    (
        "household",
        &[
            "Dish Soap", "Sponges", "Paper Towels", "Trash Bags", "Light Bulb", "AA Batteries", "Tape Roll",
        ],
    ),
];

const SIZES: &[&str] = &["Small", "Regular", "Large", "Multipack"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut tenant = String::from("demo");
    let mut db_path = String::from("./data/stockroom.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--tenant" | "-t" => {
                if i + 1 < args.len() {
                    tenant = args[i + 1].clone();
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
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>       Number of products to generate (default: 200)");
                println!("  -t, --tenant <USER>   Worker whose catalog is filled (default: demo)");
                println!("  -d, --db <PATH>       Database file path (default: ./data/stockroom.db)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Tenant:   {}", tenant);
    println!("Products: {}", count);
    println!();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let tenant = TenantId::new(tenant);
    let catalog = db.catalog(&tenant);

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.users().find_by_username(tenant.as_str()).await?.is_none() {
        println!("⚠ No account named '{}' exists yet; the products will be", tenant);
        println!("  visible once a worker with that username is created.");
    }

    let existing = catalog.count().await?;
    if existing > 0 {
        println!("⚠ Tenant already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    'outer: for (category, names) in CATEGORIES {
        for name in names.iter() {
            for size in SIZES {
                if generated >= count {
                    break 'outer;
                }

                let product = generate_product(category, name, size, generated);
                if let Err(e) = catalog.insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.name, e);
                    continue;
                }

                generated += 1;
                if generated % 50 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    println!();
    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    println!();
    println!("Verifying search...");
    let drinks = catalog.list_by_category("drinks", Some("cola")).await?;
    println!("  drinks / 'cola': {} results", drinks.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one demo product; `seed` keeps barcodes distinct within a tenant.
fn generate_product(category: &str, name: &str, size: &str, seed: usize) -> NewProduct {
    let qr_code = (seed % 3 == 0).then(|| format!("QR-{}-{}", category.to_uppercase(), seed));

    NewProduct {
        name: format!("{} {}", name, size),
        description: Some(format!("{} ({})", name, category)),
        barcode: Some(format!("590{:010}", seed)),
        qr_code,
        quantity: ((seed * 7) % 51) as i64,
        category: category.to_string(),
        image: None,
    }
}
