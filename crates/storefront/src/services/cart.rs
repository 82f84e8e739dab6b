//! Cart operations.

use std::time::Duration;

use thiserror::Error;

use bazaar_core::{ProductId, UserId};

use super::deadline::with_deadline;
use crate::db::{Datastore, RepositoryError};
use crate::error::ErrorKind;
use crate::models::{CartLine, MAX_LINE_QUANTITY};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// User id is zero or negative.
    #[error("user id must be positive")]
    InvalidUserId,

    /// Product id is zero or negative.
    #[error("product id must be positive")]
    InvalidProductId,

    /// Quantity is outside `1..=MAX_LINE_QUANTITY`.
    #[error("quantity must be between 1 and {max}", max = MAX_LINE_QUANTITY)]
    InvalidQuantity,

    /// Adding one more unit would pass `MAX_LINE_QUANTITY`.
    #[error("cart line already holds {max} units", max = MAX_LINE_QUANTITY)]
    QuantityLimit,

    /// No product with this id.
    #[error("product not found")]
    ProductNotFound,

    /// No user with this id.
    #[error("user not found")]
    UserNotFound,

    /// The product is not in the user's cart.
    #[error("product is not in the cart")]
    LineNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl CartError {
    /// Classify the error for the HTTP boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUserId
            | Self::InvalidProductId
            | Self::InvalidQuantity
            | Self::QuantityLimit => ErrorKind::InvalidArgument,
            Self::ProductNotFound | Self::UserNotFound | Self::LineNotFound => ErrorKind::NotFound,
            Self::Repository(err) => err.kind(),
        }
    }
}

/// Cart service.
pub struct CartService<'a> {
    store: &'a dyn Datastore,
    timeout: Duration,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(store: &'a dyn Datastore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Add one unit of a product to the user's cart.
    ///
    /// The first add creates a line with quantity 1 and a snapshot of the
    /// product's name, price, rating and image; later adds increment it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` or `CartError::UserNotFound` if
    /// either id does not resolve, and `CartError::QuantityLimit` if the line
    /// is already full.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(&self, user: UserId, product: ProductId) -> Result<CartLine, CartError> {
        validate_ids(user, product)?;

        let product = with_deadline(self.timeout, self.store.get_product(product))
            .await?
            .ok_or(CartError::ProductNotFound)?;
        with_deadline(self.timeout, self.store.get_user(user))
            .await?
            .ok_or(CartError::UserNotFound)?;

        let line = with_deadline(self.timeout, self.store.add_to_cart(user, &product))
            .await
            .map_err(|e| match e {
                // Deleted between the lookups and the insert.
                RepositoryError::NotFound => CartError::ProductNotFound,
                RepositoryError::QuantityLimit => CartError::QuantityLimit,
                other => CartError::Repository(other),
            })?;

        tracing::info!(line_id = %line.id, quantity = line.quantity, "Product added to cart");
        Ok(line)
    }

    /// Remove a product's line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the product is not in the cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_from_cart(&self, user: UserId, product: ProductId) -> Result<(), CartError> {
        validate_ids(user, product)?;

        let removed = with_deadline(self.timeout, self.store.remove_from_cart(user, product)).await?;
        if !removed {
            return Err(CartError::LineNotFound);
        }
        Ok(())
    }

    /// All lines in the user's cart. An empty cart is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidUserId` if `user` is not positive.
    pub async fn get_cart_items(&self, user: UserId) -> Result<Vec<CartLine>, CartError> {
        if !user.is_positive() {
            return Err(CartError::InvalidUserId);
        }
        Ok(with_deadline(self.timeout, self.store.get_cart_items(user)).await?)
    }

    /// Overwrite the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity` is outside
    /// `1..=MAX_LINE_QUANTITY` and
    /// `CartError::LineNotFound` if the product is not in the cart.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> Result<CartLine, CartError> {
        if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
            return Err(CartError::InvalidQuantity);
        }
        validate_ids(user, product)?;

        with_deadline(
            self.timeout,
            self.store.update_quantity(user, product, quantity),
        )
        .await?
        .ok_or(CartError::LineNotFound)
    }

    /// Empty the cart. Clearing an empty cart succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidUserId` if `user` is not positive.
    pub async fn clear_cart(&self, user: UserId) -> Result<u64, CartError> {
        if !user.is_positive() {
            return Err(CartError::InvalidUserId);
        }
        Ok(with_deadline(self.timeout, self.store.clear_cart(user)).await?)
    }
}

const fn validate_ids(user: UserId, product: ProductId) -> Result<(), CartError> {
    if !user.is_positive() {
        return Err(CartError::InvalidUserId);
    }
    if !product.is_positive() {
        return Err(CartError::InvalidProductId);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use bazaar_core::{Email, Phone, UserRole};

    use super::*;
    use crate::db::{CartStore, CatalogStore, MemoryDatastore, UserStore};
    use crate::models::{CategoryInput, NewUser, ProductInput};

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn seeded() -> (MemoryDatastore, UserId, ProductId) {
        let store = MemoryDatastore::new();
        let user = store
            .create_user(
                &NewUser {
                    name: "Bilal".to_owned(),
                    email: Email::parse("bilal@example.com").unwrap(),
                    phone: Phone::parse("03001234567").unwrap(),
                    role: UserRole::User,
                },
                "hash",
            )
            .await
            .unwrap();
        let category = store
            .create_category(&CategoryInput {
                name: "Books".to_owned(),
                slug: "books".to_owned(),
            })
            .await
            .unwrap();
        let product = store
            .create_product(&ProductInput {
                category_id: category.id,
                name: "Rust in Action".to_owned(),
                description: String::new(),
                price: Decimal::new(3999, 2),
                quantity: 10,
                rating: 5,
                image: None,
            })
            .await
            .unwrap();
        (store, user.id, product.id)
    }

    #[tokio::test]
    async fn test_add_twice_gives_quantity_two() {
        let (store, user, product) = seeded().await;
        let cart = CartService::new(&store, TIMEOUT);

        cart.add_to_cart(user, product).await.unwrap();
        cart.add_to_cart(user, product).await.unwrap();

        let lines = cart.get_cart_items(user).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let (store, user, _) = seeded().await;
        let cart = CartService::new(&store, TIMEOUT);

        let err = cart.add_to_cart(user, ProductId::new(404)).await.unwrap_err();
        assert!(matches!(err, CartError::ProductNotFound));
    }

    #[tokio::test]
    async fn test_add_unknown_user() {
        let (store, _, product) = seeded().await;
        let cart = CartService::new(&store, TIMEOUT);

        let err = cart.add_to_cart(UserId::new(404), product).await.unwrap_err();
        assert!(matches!(err, CartError::UserNotFound));
    }

    #[tokio::test]
    async fn test_remove_missing_line_leaves_cart_unchanged() {
        let (store, user, product) = seeded().await;
        let cart = CartService::new(&store, TIMEOUT);
        cart.add_to_cart(user, product).await.unwrap();

        let err = cart
            .remove_from_cart(user, ProductId::new(404))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::LineNotFound));
        assert_eq!(store.get_cart_items(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_quantity_rejects_non_positive() {
        let (store, user, product) = seeded().await;
        let cart = CartService::new(&store, TIMEOUT);
        cart.add_to_cart(user, product).await.unwrap();

        for qty in [0, -1] {
            let err = cart.update_quantity(user, product, qty).await.unwrap_err();
            assert!(matches!(err, CartError::InvalidQuantity));
        }
        assert_eq!(cart.get_cart_items(user).await.unwrap()[0].quantity, 1);

        let line = cart.update_quantity(user, product, 4).await.unwrap();
        assert_eq!(line.quantity, 4);
    }

    #[tokio::test]
    async fn test_update_quantity_rejects_above_limit() {
        let (store, user, product) = seeded().await;
        let cart = CartService::new(&store, TIMEOUT);
        cart.add_to_cart(user, product).await.unwrap();

        for qty in [MAX_LINE_QUANTITY + 1, i32::MAX] {
            let err = cart.update_quantity(user, product, qty).await.unwrap_err();
            assert!(matches!(err, CartError::InvalidQuantity));
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(cart.get_cart_items(user).await.unwrap()[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_add_to_full_line_is_rejected() {
        let (store, user, product) = seeded().await;
        let cart = CartService::new(&store, TIMEOUT);
        cart.add_to_cart(user, product).await.unwrap();
        cart.update_quantity(user, product, MAX_LINE_QUANTITY)
            .await
            .unwrap();

        let err = cart.add_to_cart(user, product).await.unwrap_err();
        assert!(matches!(err, CartError::QuantityLimit));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            cart.get_cart_items(user).await.unwrap()[0].quantity,
            MAX_LINE_QUANTITY
        );
    }

    #[tokio::test]
    async fn test_update_quantity_missing_line() {
        let (store, user, product) = seeded().await;
        let cart = CartService::new(&store, TIMEOUT);

        let err = cart.update_quantity(user, product, 2).await.unwrap_err();
        assert!(matches!(err, CartError::LineNotFound));
    }

    #[tokio::test]
    async fn test_invalid_ids() {
        let (store, _, _) = seeded().await;
        let cart = CartService::new(&store, TIMEOUT);

        assert!(matches!(
            cart.get_cart_items(UserId::new(0)).await.unwrap_err(),
            CartError::InvalidUserId
        ));
        assert!(matches!(
            cart.update_quantity(UserId::new(1), ProductId::new(-3), 1)
                .await
                .unwrap_err(),
            CartError::InvalidProductId
        ));
    }

    #[tokio::test]
    async fn test_clear_empty_cart_is_not_an_error() {
        let (store, user, _) = seeded().await;
        let cart = CartService::new(&store, TIMEOUT);
        assert_eq!(cart.clear_cart(user).await.unwrap(), 0);
    }
}
