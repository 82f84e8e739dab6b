//! Cart line domain type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bazaar_core::{CartLineId, ProductId, UserId};

/// Most units of one product a cart line can hold.
pub const MAX_LINE_QUANTITY: i32 = 9_999;

/// One line of a user's cart, unique per (user, product).
///
/// `product_name`, `price`, `rating` and `image` are a snapshot taken when
/// the line was first created. Later product edits do not touch them, and
/// checkout charges the snapshotted price.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Decimal,
    /// Always in `1..=MAX_LINE_QUANTITY`.
    pub quantity: i32,
    pub rating: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
