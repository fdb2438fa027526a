//! # Seed Data Generator
//!
//! Fills a development catalog with grocery products.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p sennada-db --bin seed
//!
//! # Generate a custom amount into a specific file
//! cargo run -p sennada-db --bin seed -- --count 1000 --db ./data/sennada.db
//! ```
//!
//! Every product gets a reference `{FAMILY}-{NNN}`, a 613-prefixed
//! barcode, three price tiers and a stock level. Every fifth product is not
//! stock-tracked.

use sennada_core::{Money, NewProduct};
use sennada_db::{Database, DbConfig};
use std::env;

/// Product families for realistic test data
const FAMILIES: &[(&str, &[&str])] = &[
    (
        "EPI",
        &[
            "Semoule fine",
            "Semoule grosse",
            "Farine",
            "Sucre",
            "Sel",
            "Riz",
            "Lentilles",
            "Pois chiches",
            "Haricots blancs",
            "Pâtes",
        ],
    ),
    (
        "BOI",
        &[
            "Eau minérale",
            "Eau gazeuse",
            "Jus d'orange",
            "Jus de pomme",
            "Limonade",
            "Lait",
            "Lben",
            "Café moulu",
            "Thé vert",
        ],
    ),
    (
        "HYG",
        &[
            "Savon",
            "Shampooing",
            "Dentifrice",
            "Lessive",
            "Eau de javel",
            "Liquide vaisselle",
        ],
    ),
    (
        "CON",
        &[
            "Concentré de tomate",
            "Thon",
            "Sardines",
            "Harissa",
            "Confiture",
            "Olives",
        ],
    ),
];

/// Pack sizes with their price offset in centimes
const SIZES: &[(&str, i64)] = &[
    ("250g", 0),
    ("500g", 4_000),
    ("1kg", 9_000),
    ("5kg", 40_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./sennada_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Sennada Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./sennada_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Sennada Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let repo = db.products();
    let start = std::time::Instant::now();
    let mut generated = 0;

    'outer: for (family_idx, (family, names)) in FAMILIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = family_idx * 1000 + name_idx * 10 + size_idx;
                let form = generate_product(family, name, size, *addon, seed);

                if let Err(e) = repo.create(&form).await {
                    eprintln!("Failed to insert {}: {}", form.title, e);
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

    let hits = repo.search("semoule").await?;
    println!("  Search 'semoule': {} results", hits.len());

    db.close().await;
    println!("✓ Seed complete!");
    Ok(())
}

/// Builds one product form from deterministic pseudo-random values.
fn generate_product(family: &str, name: &str, size: &str, addon: i64, seed: usize) -> NewProduct {
    // 60,00 D.A - 459,00 D.A before the size offset
    let detail = 6_000 + ((seed * 37) % 40_000) as i64 + addon;
    let wholesale = detail * 85 / 100;
    let semi_wholesale = detail * 92 / 100;

    NewProduct {
        reference: Some(format!("{}-{:03}", family, seed % 1000)),
        barcode: Some(format!("613{:010}", seed)),
        title: format!("{} {}", name, size),
        detail_price: Money::from_cents(detail),
        wholesale_price: Money::from_cents(wholesale),
        semi_wholesale_price: Money::from_cents(semi_wholesale),
        stock: (seed % 120) as f64,
        is_follow_stock: seed % 5 != 0,
        ..NewProduct::default()
    }
}
