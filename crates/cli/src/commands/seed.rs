//! Seed the catalog with demo data.
//!
//! Inserts one category and a handful of products, going through the same
//! validation as the admin API. Does nothing if the catalog already has
//! products.

use std::time::Duration;

use rust_decimal::Decimal;

use bazaar_storefront::db::{self, PgDatastore};
use bazaar_storefront::models::{CategoryInput, ProductInput};
use bazaar_storefront::services::CatalogService;

use super::{CliError, database_url};

const SEED_TIMEOUT: Duration = Duration::from_secs(10);
const CATEGORY_SLUG: &str = "kitchen";

/// Demo products: name, description, price in cents, stock, rating.
const PRODUCTS: &[(&str, &str, i64, i32, i32)] = &[
    ("Enamel Kettle", "1.7 litre stovetop kettle", 2_499, 40, 4),
    ("Cast Iron Skillet", "26 cm pre-seasoned skillet", 3_950, 25, 5),
    ("Chef's Knife", "20 cm stainless steel blade", 5_900, 15, 5),
    ("Linen Apron", "Adjustable, with two pockets", 1_800, 60, 4),
];

/// Insert the demo catalog.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or a row is rejected.
pub async fn run() -> Result<(), CliError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let store = PgDatastore::new(db::create_pool(&database_url).await?);
    let catalog = CatalogService::new(&store, SEED_TIMEOUT);

    if !catalog.list_products().await?.is_empty() {
        tracing::info!("Catalog already has products, skipping seed");
        return Ok(());
    }

    let existing = catalog
        .list_categories()
        .await?
        .into_iter()
        .find(|c| c.slug == CATEGORY_SLUG);
    let category = if let Some(category) = existing {
        category
    } else {
        let category = catalog
            .create_category(&CategoryInput {
                name: "Kitchen".to_owned(),
                slug: CATEGORY_SLUG.to_owned(),
            })
            .await?;
        tracing::info!(category_id = %category.id, "Category created");
        category
    };

    for &(name, description, cents, quantity, rating) in PRODUCTS {
        let product = catalog
            .create_product(&ProductInput {
                category_id: category.id,
                name: name.to_owned(),
                description: description.to_owned(),
                price: Decimal::new(cents, 2),
                quantity,
                rating,
                image: None,
            })
            .await?;
        tracing::info!(product_id = %product.id, name, "Product created");
    }

    tracing::info!(products = PRODUCTS.len(), "Seeding complete!");
    Ok(())
}
