//! Catalog domain types: categories and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{CategoryId, ProductId};

/// Highest rating a product can carry.
pub const MAX_RATING: i32 = 5;

/// Largest amount a `NUMERIC(12, 2)` column holds: 9 999 999 999.99.
///
/// Bounds product prices and order totals.
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Digits allowed after the decimal point in a price.
pub const PRICE_SCALE: u32 = 2;

/// A product category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Admin input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
}

impl CategoryInput {
    /// Check the input before it reaches the datastore.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when the name is blank or the slug is
    /// not lowercase ASCII letters, digits and dashes.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("category name cannot be empty".to_owned());
        }
        let slug_ok = !self.slug.is_empty()
            && self
                .slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !slug_ok {
            return Err("slug must be lowercase letters, digits and dashes".to_owned());
        }
        Ok(())
    }
}

/// A product in the catalog.
///
/// `quantity` is the stock count. It is informational only: checkout never
/// decrements it.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub rating: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin input for creating or overwriting a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub category_id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub image: Option<String>,
}

impl ProductInput {
    /// Check the input before it reaches the datastore.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for a blank name, a negative price or
    /// stock count, a price above [`MAX_PRICE`] or with more than two
    /// decimals, or a rating outside `0..=5`.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("product name cannot be empty".to_owned());
        }
        if self.price.is_sign_negative() {
            return Err("price cannot be negative".to_owned());
        }
        if self.price > MAX_PRICE {
            return Err(format!("price cannot exceed {MAX_PRICE}"));
        }
        if self.price.normalize().scale() > PRICE_SCALE {
            return Err(format!("price cannot have more than {PRICE_SCALE} decimals"));
        }
        if self.quantity < 0 {
            return Err("quantity cannot be negative".to_owned());
        }
        if !(0..=MAX_RATING).contains(&self.rating) {
            return Err(format!("rating must be between 0 and {MAX_RATING}"));
        }
        Ok(())
    }
}
