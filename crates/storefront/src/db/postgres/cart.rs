//! Cart lines.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use bazaar_core::{CartLineId, ProductId, UserId};

use super::{PgDatastore, map_write_error};
use crate::db::{CartStore, RepositoryError};
use crate::models::{CartLine, MAX_LINE_QUANTITY, Product};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(super) struct CartLineRow {
    id: CartLineId,
    user_id: UserId,
    product_id: ProductId,
    product_name: String,
    price: Decimal,
    quantity: i32,
    rating: i32,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            product_name: row.product_name,
            price: row.price,
            quantity: row.quantity,
            rating: row.rating,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(super) const CART_LINE_COLUMNS: &str = "id, user_id, product_id, product_name, price, \
                                            quantity, rating, image, created_at, updated_at";

#[async_trait]
impl CartStore for PgDatastore {
    async fn add_to_cart(
        &self,
        user: UserId,
        product: &Product,
    ) -> Result<CartLine, RepositoryError> {
        // The snapshot columns are only written on insert. A line already at
        // the limit is left alone and no row comes back.
        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            "INSERT INTO bazaar.cart_line \
                 (user_id, product_id, product_name, price, quantity, rating, image) \
             VALUES ($1, $2, $3, $4, 1, $5, $6) \
             ON CONFLICT (user_id, product_id) DO UPDATE \
                 SET quantity = cart_line.quantity + 1, updated_at = NOW() \
                 WHERE cart_line.quantity < $7 \
             RETURNING {CART_LINE_COLUMNS}"
        ))
        .bind(user)
        .bind(product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.rating)
        .bind(&product.image)
        .bind(MAX_LINE_QUANTITY)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "cart line already exists"))?;

        row.map(Into::into).ok_or(RepositoryError::QuantityLimit)
    }

    async fn remove_from_cart(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM bazaar.cart_line WHERE user_id = $1 AND product_id = $2")
                .bind(user)
                .bind(product)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_cart_items(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            "SELECT {CART_LINE_COLUMNS} FROM bazaar.cart_line WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_quantity(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            "UPDATE bazaar.cart_line SET quantity = $3, updated_at = NOW() \
             WHERE user_id = $1 AND product_id = $2 \
             RETURNING {CART_LINE_COLUMNS}"
        ))
        .bind(user)
        .bind(product)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn clear_cart(&self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM bazaar.cart_line WHERE user_id = $1")
            .bind(user)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
