//! Datastore layer for the storefront.
//!
//! # Backends
//!
//! - [`postgres::PgDatastore`] - `PostgreSQL` (schema `bazaar`), used in production
//! - [`memory::MemoryDatastore`] - in-process maps behind one mutex, used by
//!   tests and by `STOREFRONT_DATABASE_URL=memory:`
//!
//! Both implement the [`Datastore`] trait, and the rest of the crate only
//! ever sees `Arc<dyn Datastore>`.
//!
//! ## Tables
//!
//! - `user` - Shoppers and administrators (argon2 password hashes)
//! - `category`, `product` - The catalog
//! - `cart_line` - One row per (user, product) with a snapshot of the product
//! - `address` - Shipping addresses; the newest one is used at checkout
//! - `order`, `order_item`, `payment` - Written once, by checkout
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use bazaar_core::{AddressId, Email, ProductId, UserId};

use crate::checkout::{CheckoutError, CheckoutScope};
use crate::error::ErrorKind;
use crate::models::{
    Address, AddressInput, CartLine, Category, CategoryInput, NewUser, OrderDetails, Product,
    ProductInput, User,
};

pub use memory::MemoryDatastore;
pub use postgres::PgDatastore;

/// URL that selects the in-memory datastore instead of `PostgreSQL`.
pub const MEMORY_URL: &str = "memory:";

/// Errors that can occur during datastore operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A cart line is already at `MAX_LINE_QUANTITY`.
    #[error("cart line quantity limit reached")]
    QuantityLimit,

    /// The operation did not finish before its deadline.
    #[error("operation timed out")]
    Timeout,
}

impl RepositoryError {
    /// Classify the error for the HTTP boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Database(_) | Self::DataCorruption(_) => ErrorKind::Internal,
            Self::NotFound => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::QuantityLimit => ErrorKind::InvalidArgument,
            Self::Timeout => ErrorKind::DeadlineExceeded,
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Open the datastore named by `database_url`.
///
/// `memory:` gives a fresh [`MemoryDatastore`]; anything else is treated as a
/// `PostgreSQL` URL.
///
/// # Errors
///
/// Returns `sqlx::Error` if the `PostgreSQL` pool cannot be created.
pub async fn connect(database_url: &SecretString) -> Result<Arc<dyn Datastore>, sqlx::Error> {
    if database_url.expose_secret() == MEMORY_URL {
        tracing::warn!("Using in-memory datastore; data will not survive a restart");
        return Ok(Arc::new(MemoryDatastore::new()));
    }
    let pool = create_pool(database_url).await?;
    Ok(Arc::new(PgDatastore::new(pool)))
}

// =============================================================================
// Store traits
// =============================================================================

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user with an already-hashed password.
    ///
    /// Fails with `Conflict("email already exists")` or
    /// `Conflict("phone already exists")`.
    async fn create_user(&self, user: &NewUser, password_hash: &str)
    -> Result<User, RepositoryError>;

    /// Fetch a user by id.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user by email together with the stored password hash.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Grant the admin role. Returns `NotFound` if no user has this email.
    async fn promote_to_admin(&self, email: &Email) -> Result<User, RepositoryError>;
}

/// Categories and products.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fails with `Conflict` if the slug is taken.
    async fn create_category(&self, input: &CategoryInput) -> Result<Category, RepositoryError>;

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    /// Fails with `NotFound` if the category does not exist.
    async fn create_product(&self, input: &ProductInput) -> Result<Product, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// All products, oldest first.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Products whose name contains `query`, ignoring case.
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, RepositoryError>;

    /// Overwrite every field of a product. `None` if it does not exist.
    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Returns `false` if the product did not exist. Fails with `Conflict`
    /// if the product appears on an order.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;
}

/// Per-user carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Add one unit of `product`. Increments the existing line, or creates a
    /// line with quantity 1 and a snapshot of the product. Fails with
    /// `QuantityLimit` when the line already holds `MAX_LINE_QUANTITY`.
    async fn add_to_cart(&self, user: UserId, product: &Product)
    -> Result<CartLine, RepositoryError>;

    /// Delete the line for `product`. Returns `false` if there was none.
    async fn remove_from_cart(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, RepositoryError>;

    /// The user's lines, oldest first.
    async fn get_cart_items(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Set the quantity of an existing line. `None` if there is no line.
    async fn update_quantity(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> Result<Option<CartLine>, RepositoryError>;

    /// Delete every line. Returns the number removed.
    async fn clear_cart(&self, user: UserId) -> Result<u64, RepositoryError>;
}

/// Shipping addresses.
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn add_address(
        &self,
        user: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError>;

    /// Newest first.
    async fn list_addresses(&self, user: UserId) -> Result<Vec<Address>, RepositoryError>;

    /// `None` if the address does not exist or belongs to someone else.
    async fn update_address(
        &self,
        id: AddressId,
        user: UserId,
        input: &AddressInput,
    ) -> Result<Option<Address>, RepositoryError>;

    /// Returns `false` if the address does not exist or belongs to someone else.
    async fn delete_address(&self, id: AddressId, user: UserId) -> Result<bool, RepositoryError>;

    /// The address with the greatest `created_at` (ties broken by id).
    async fn latest_address(&self, user: UserId) -> Result<Option<Address>, RepositoryError>;
}

/// Orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Convert cart lines into one order, atomically.
    ///
    /// Concurrent checkouts for the same user are serialized, so a line is
    /// never ordered twice.
    async fn place_order(
        &self,
        user: UserId,
        scope: CheckoutScope,
    ) -> Result<OrderDetails, CheckoutError>;

    /// The user's orders, newest first.
    async fn list_orders(&self, user: UserId) -> Result<Vec<OrderDetails>, RepositoryError>;
}

/// Everything the storefront needs from a backend.
#[async_trait]
pub trait Datastore: UserStore + CatalogStore + CartStore + AddressStore + OrderStore {
    /// Readiness check.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Escape `%`, `_` and `\` for use inside a `LIKE` pattern.
pub(crate) fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_repository_error_kinds() {
        assert_eq!(RepositoryError::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            RepositoryError::Conflict("x".to_owned()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(RepositoryError::Timeout.kind(), ErrorKind::DeadlineExceeded);
        assert_eq!(
            RepositoryError::DataCorruption("x".to_owned()).kind(),
            ErrorKind::Internal
        );
    }
}
