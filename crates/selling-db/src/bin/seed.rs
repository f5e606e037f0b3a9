//! # Seed Data Generator
//!
//! Populates one backend with demo clients, products and sales for
//! development.
//!
//! ## Usage
//! ```bash
//! # 10 clients, 20 products on the primary backend (defaults)
//! cargo run -p selling-db --bin seed
//!
//! # Custom amounts on another backend
//! cargo run -p selling-db --bin seed -- --backend secondary --clients 50 --products 100
//!
//! # Backend paths from a config file
//! cargo run -p selling-db --bin seed -- --config ./selling.toml
//! ```
//!
//! ## Generated Sales
//! Every client gets one sale of three products. Sales cycle through the
//! lifecycle: finished, cancelled, left started.

use chrono::{Duration, Utc};
use selling_core::{Address, Client, Money, Product, Sale, SaleStatus};
use selling_db::{
    generate_sale_code, BackendId, BackendsConfig, Database, Repository, SaleOperations,
};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Product names for demo data
const PRODUCT_NAMES: &[&str] = &[
    "Notebook",
    "Ballpoint Pen",
    "Stapler",
    "Desk Lamp",
    "USB Cable",
    "Coffee Mug",
    "Backpack",
    "Water Bottle",
    "Headphones",
    "Calculator",
];

const CITIES: &[(&str, &str)] = &[
    ("Springfield", "Illinois"),
    ("Portland", "Oregon"),
    ("Austin", "Texas"),
    ("Madison", "Wisconsin"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut clients: usize = 10;
    let mut products: usize = 20;
    let mut backend = BackendId::Primary;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" => {
                if i + 1 < args.len() {
                    clients = args[i + 1].parse().unwrap_or(10);
                    i += 1;
                }
            }
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    products = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--backend" | "-b" => {
                if i + 1 < args.len() {
                    backend = args[i + 1].parse()?;
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
                println!("Selling Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("      --clients <N>      Number of clients, one sale each (default: 10)");
                println!("  -p, --products <N>     Number of products (default: 20)");
                println!("  -b, --backend <ID>     primary, secondary or tertiary (default: primary)");
                println!("  -c, --config <PATH>    Backend configuration file (TOML)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let backends = BackendsConfig::load(config_path.as_deref())?;
    let db = Database::prepare(backends).await?;

    println!("Selling Seed Data Generator");
    println!("===========================");
    println!("Backend:  {} ({})", backend, db.backend(backend).database_path.display());
    println!("Clients:  {}", clients);
    println!("Products: {}", products);
    println!();

    let existing = db.clients(backend).find_all().await?;
    if !existing.is_empty() {
        println!("⚠ Backend already has {} clients", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    let product_repo = db.products(backend);
    let mut stored_products = Vec::with_capacity(products);
    for index in 0..products {
        let product = product_repo.register(generate_product(index)).await?;
        stored_products.push(product);
    }
    println!("✓ Registered {} products", stored_products.len());

    let client_repo = db.clients(backend);
    let sales = db.sales(backend);
    let (mut finished, mut cancelled) = (0, 0);

    for index in 0..clients {
        let client = client_repo.register(generate_client(index)).await?;

        let sold_at = Utc::now() - Duration::days(index as i64);
        let mut sale = Sale::new(generate_sale_code(), sold_at).with_client(client);
        for offset in 0..3 {
            if let Some(product) = stored_products.get((index + offset * 7) % products.max(1)) {
                let quantity = u32::try_from(offset + 1).unwrap_or(1);
                sale.add_product(product, quantity)?;
            }
        }

        let mut sale = sales.register(sale).await?;
        match index % 3 {
            0 => {
                sale.status = SaleStatus::Finished;
                sales.finalize_sale(&sale).await?;
                finished += 1;
            }
            1 => {
                sale.status = SaleStatus::Cancelled;
                sales.cancel_sale(&sale).await?;
                cancelled += 1;
            }
            _ => {}
        }

        info!(code = %sale.code, total = %sale.total_price(), status = %sale.status, "Seeded sale");
    }
    println!(
        "✓ Registered {} clients and {} sales ({} finished, {} cancelled)",
        clients, clients, finished, cancelled
    );

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,selling=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

fn generate_client(seed: usize) -> Client {
    let (city, state) = CITIES[seed % CITIES.len()];

    Client {
        id: None,
        name: format!("Demo Client {}", seed + 1),
        tax_id: format!("{:011}", 10_000_000_000_u64 + seed as u64),
        phone: format!("555-{:04}", seed % 10_000),
        address: Address {
            street: "Market Street".to_string(),
            number: format!("{}", 100 + seed),
            city: city.to_string(),
            state: state.to_string(),
        },
    }
}

fn generate_product(seed: usize) -> Product {
    let name = PRODUCT_NAMES[seed % PRODUCT_NAMES.len()];

    // $1.99 - $9.98
    let price_cents = 199 + ((seed * 17) % 800) as i64;

    Product {
        id: None,
        code: format!("PRD-{:05}", seed),
        name: format!("{} #{}", name, seed / PRODUCT_NAMES.len() + 1),
        description: format!("Demo {}", name.to_lowercase()),
        price: Money::from_cents(price_cents),
    }
}
