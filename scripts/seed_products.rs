//! Seed script for the catalog store
//!
//! Populates the Sled database at `CATALOG_DB_PATH` with a handful of sample
//! products. Run it while the server is stopped (Sled holds an exclusive lock).
//! Run: cargo run --bin seed_products

use shop_catalog::config::Config;
use shop_catalog::logging;
use shop_catalog::models::ProductCreate;
use shop_catalog::storage::Storage;

const SAMPLES: &[(&str, &str, f64)] = &[
    ("Mechanical keyboard", "Tenkeyless, brown switches", 89.0),
    ("USB-C hub", "7-in-1 with HDMI and card reader", 34.5),
    ("Desk lamp", "LED, adjustable colour temperature", 27.99),
    ("Notebook", "A5 dotted, 120 pages", 6.5),
    ("Water bottle", "Insulated steel, 750 ml", 19.0),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let _log_guard = logging::init(&config);

    let storage = Storage::open(&config.db_path)?;
    let session = storage.session();

    for (title, description, price) in SAMPLES {
        let product = session.create(ProductCreate {
            title: title.to_string(),
            description: description.to_string(),
            price: *price,
        })?;
        tracing::info!(id = product.id, title = %product.title, "seeded product");
    }

    tracing::info!(count = SAMPLES.len(), path = %config.db_path.display(), "seeding finished");
    Ok(())
}
