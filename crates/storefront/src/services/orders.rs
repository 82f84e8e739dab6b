//! Checkout and order history.

use std::time::Duration;

use bazaar_core::{ProductId, UserId};

use super::deadline::with_deadline;
use crate::checkout::{CheckoutError, CheckoutScope};
use crate::db::{Datastore, RepositoryError};
use crate::models::OrderDetails;

/// Order service.
pub struct OrderService<'a> {
    store: &'a dyn Datastore,
    timeout: Duration,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(store: &'a dyn Datastore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Turn the whole cart into one order and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart`, `CheckoutError::NoAddress` or
    /// `CheckoutError::TotalTooLarge` without writing anything.
    #[tracing::instrument(skip(self))]
    pub async fn checkout(&self, user: UserId) -> Result<OrderDetails, CheckoutError> {
        if !user.is_positive() {
            return Err(CheckoutError::InvalidUserId);
        }
        self.place(user, CheckoutScope::WholeCart).await
    }

    /// Order a single cart line, leaving the rest of the cart alone.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::LineNotFound` if the product is not in the
    /// cart and `CheckoutError::NoAddress` if there is no address on file.
    #[tracing::instrument(skip(self))]
    pub async fn instant_buy(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<OrderDetails, CheckoutError> {
        if !user.is_positive() {
            return Err(CheckoutError::InvalidUserId);
        }
        if !product.is_positive() {
            return Err(CheckoutError::InvalidProductId);
        }
        self.place(user, CheckoutScope::SingleLine(product)).await
    }

    async fn place(
        &self,
        user: UserId,
        scope: CheckoutScope,
    ) -> Result<OrderDetails, CheckoutError> {
        let details = with_deadline(self.timeout, self.store.place_order(user, scope)).await?;

        tracing::info!(
            order_id = %details.order.id,
            items = details.items.len(),
            total = %details.order.total_price,
            "Order placed"
        );
        Ok(details)
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the datastore fails.
    pub async fn list_orders(&self, user: UserId) -> Result<Vec<OrderDetails>, RepositoryError> {
        with_deadline(self.timeout, self.store.list_orders(user)).await
    }
}
