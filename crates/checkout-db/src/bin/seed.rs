//! # Seed Data Generator
//!
//! Populates the local catalogue with development products.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p checkout-db --bin seed
//!
//! # Generate custom amount into a specific database
//! cargo run -p checkout-db --bin seed -- --count 2000 --db ./data/checkout.db
//! ```
//!
//! ## Generated Products
//! Output is deterministic: the same `--count` always yields the same
//! catalogue (ids aside).
//!
//! - Code: `{CATEGORY}-{NNN}`, numbered per category
//! - Price: 0.99 to 19.98 with two decimals
//! - Minimum price: 70% of price, rounded half-up
//! - Stock: 0 to 100
//! - Every 17th product disabled, for exercising `ProductNotActive`

use std::env;

use checkout_core::money::round_currency;
use checkout_core::validation::validate_product_code;
use checkout_core::{Product, SaleStatus};
use checkout_db::repository::product::generate_product_id;
use checkout_db::{Database, DbConfig};
use rust_decimal::Decimal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Product categories and the names generated within them.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEV",
        &["Cola", "Lemon Soda", "Sparkling Water", "Orange Juice", "Iced Tea", "Cold Brew"],
    ),
    (
        "SNK",
        &["Salted Chips", "Pretzels", "Chocolate Bar", "Gummy Bears", "Trail Mix", "Popcorn"],
    ),
    (
        "DRY",
        &["Whole Milk", "Greek Yogurt", "Cheddar", "Butter", "Cream Cheese", "Oat Milk"],
    ),
    (
        "GRO",
        &["Spaghetti", "Basmati Rice", "Canned Tomatoes", "Peanut Butter", "Honey", "Oatmeal"],
    ),
];

/// Size variants appended to product names.
const SIZES: &[&str] = &["Small", "Regular", "Large", "Family"];

/// Every Nth product is seeded disabled.
const DISABLED_EVERY: usize = 17;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,checkout=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./checkout_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
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
                println!("Checkout Engine Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./checkout_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Checkout Engine Seed Data Generator");
    println!("======================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!(
            "  Sales on file: {} draft, {} finalized",
            db.sales().count_by_status(SaleStatus::Draft).await?,
            db.sales().count_by_status(SaleStatus::Finalized).await?
        );
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut disabled = 0;

    for (seed, (product, stock)) in catalogue(count).into_iter().enumerate() {
        if let Err(e) = validate_product_code(&product.product_code) {
            warn!(code = %product.product_code, error = %e, "Skipping invalid product code");
            continue;
        }

        if let Err(e) = db.products().insert(&product, stock).await {
            eprintln!("Failed to insert {}: {}", product.product_code, e);
            continue;
        }

        generated += 1;
        if !product.enabled {
            disabled += 1;
        }

        if (seed + 1) % 100 == 0 {
            info!(generated, "Seeding in progress");
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);
    println!("  Disabled: {}", disabled);
    println!("  Sellable: {}", db.products().count().await?);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds `count` products with their opening stock.
fn catalogue(count: usize) -> Vec<(Product, i64)> {
    let mut products = Vec::with_capacity(count);
    let mut per_category = vec![0usize; CATEGORIES.len()];

    let mut seed = 0usize;
    'outer: for size in SIZES {
        for (category_idx, (category, names)) in CATEGORIES.iter().enumerate() {
            for name in names.iter() {
                if products.len() >= count {
                    break 'outer;
                }
                per_category[category_idx] += 1;
                let code = format!("{}-{:03}", category, per_category[category_idx]);
                products.push(generate_product(code, name, size, seed));
                seed += 1;
            }
        }
    }

    // Past the name × size grid, keep numbering plain products
    while products.len() < count {
        let category_idx = seed % CATEGORIES.len();
        let (category, names) = CATEGORIES[category_idx];
        per_category[category_idx] += 1;
        let code = format!("{}-{:03}", category, per_category[category_idx]);
        products.push(generate_product(code, names[seed % names.len()], "Value", seed));
        seed += 1;
    }

    products
}

/// Generates a single product with deterministic data.
fn generate_product(code: String, name: &str, size: &str, seed: usize) -> (Product, i64) {
    // 0.99 to 19.98
    let price = Decimal::new(99 + ((seed * 37) % 1900) as i64, 2);
    let min_price = round_currency(price * Decimal::new(70, 2));
    let stock = (seed % 101) as i64;

    let product = Product {
        id: generate_product_id(),
        product_code: code,
        name: format!("{} {}", name, size),
        price,
        min_price,
        enabled: (seed + 1) % DISABLED_EVERY != 0,
        deleted: false,
    };

    (product, stock)
}
