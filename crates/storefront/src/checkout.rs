//! Cart-to-order conversion.
//!
//! Checkout is split in two halves. [`CheckoutPlan::build`] is pure: it
//! looks at the cart lines and the shipping address already read by the
//! datastore and decides exactly what will be written. The datastore then
//! applies the plan inside one transaction (`OrderStore::place_order`), so a
//! failure anywhere leaves the cart and order tables untouched.
//!
//! ```text
//! lock user ─▶ read lines ─▶ read latest address ─▶ plan ─▶ write order,
//!                  │                 │                        items, payment,
//!                  ▼                 ▼                        delete lines
//!              EmptyCart         NoAddress                 ─▶ commit
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use bazaar_core::{AddressId, CartLineId, OrderStatus, PaymentMethod, ProductId, UserId};

use crate::db::RepositoryError;
use crate::error::ErrorKind;
use crate::models::{Address, CartLine, MAX_PRICE};

/// Which cart lines a checkout consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutScope {
    /// Every line in the user's cart.
    WholeCart,
    /// Only the line for one product ("instant buy").
    SingleLine(ProductId),
}

/// Errors that can occur while checking out.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// User id is zero or negative.
    #[error("user id must be positive")]
    InvalidUserId,

    /// Product id is zero or negative.
    #[error("product id must be positive")]
    InvalidProductId,

    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The user has no shipping address on file.
    #[error("no shipping address on file")]
    NoAddress,

    /// The order total does not fit the order amount columns.
    #[error("order total exceeds {max}", max = MAX_PRICE)]
    TotalTooLarge,

    /// Instant buy for a product that is not in the cart.
    #[error("product {0} is not in the cart")]
    LineNotFound(ProductId),

    /// Datastore failure; nothing was written.
    #[error("checkout failed: {0}")]
    Repository(#[from] RepositoryError),
}

impl CheckoutError {
    /// Classify the error for the HTTP boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUserId | Self::InvalidProductId | Self::TotalTooLarge => {
                ErrorKind::InvalidArgument
            }
            Self::EmptyCart => ErrorKind::EmptyCart,
            Self::NoAddress => ErrorKind::NoAddress,
            Self::LineNotFound(_) => ErrorKind::NotFound,
            Self::Repository(err) => err.kind(),
        }
    }
}

/// One order item to be written, copied from a cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedItem {
    pub product_id: ProductId,
    pub quantity: i32,
    /// The cart line's snapshotted unit price.
    pub price: Decimal,
}

impl PlannedItem {
    /// Unit price multiplied by quantity, `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Everything a single checkout will write.
///
/// Exactly one order is produced per checkout, whatever the number of lines.
/// The payment amount is the order total by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub user_id: UserId,
    pub address_id: AddressId,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub items: Vec<PlannedItem>,
    /// Cart lines to delete once the order is written.
    pub consumed: Vec<CartLineId>,
}

impl CheckoutPlan {
    /// Decide what a checkout writes.
    ///
    /// Lines are checked before the address, so an empty cart reports
    /// `EmptyCart` even when the user also has no address.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if `lines` is empty,
    /// `CheckoutError::NoAddress` if `address` is `None` and
    /// `CheckoutError::TotalTooLarge` if the total is above [`MAX_PRICE`].
    pub fn build(
        user_id: UserId,
        lines: &[CartLine],
        address: Option<&Address>,
    ) -> Result<Self, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let address = address.ok_or(CheckoutError::NoAddress)?;

        let items: Vec<PlannedItem> = lines
            .iter()
            .map(|line| PlannedItem {
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.price,
            })
            .collect();
        let total = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.line_total()?))
            .filter(|total| *total <= MAX_PRICE)
            .ok_or(CheckoutError::TotalTooLarge)?;

        Ok(Self {
            user_id,
            address_id: address.id,
            total,
            status: OrderStatus::Ordered,
            payment_method: PaymentMethod::CashOnDelivery,
            items,
            consumed: lines.iter().map(|line| line.id).collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn line(id: i64, product: i64, price: i64, quantity: i32) -> CartLine {
        let now = Utc::now();
        CartLine {
            id: CartLineId::new(id),
            user_id: UserId::new(7),
            product_id: ProductId::new(product),
            product_name: format!("product {product}"),
            price: Decimal::from(price),
            quantity,
            rating: 0,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn address() -> Address {
        let now = Utc::now();
        Address {
            id: AddressId::new(3),
            user_id: UserId::new(7),
            street: "1 Mall Road".to_owned(),
            city: "Lahore".to_owned(),
            state: "Punjab".to_owned(),
            country: "PK".to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_total_is_sum_of_line_totals() {
        let lines = [line(1, 10, 10, 2), line(2, 11, 5, 3)];
        let plan = CheckoutPlan::build(UserId::new(7), &lines, Some(&address())).unwrap();

        assert_eq!(plan.total, Decimal::from(35));
        assert_eq!(plan.items.len(), 2);
        let items_sum: Decimal = plan.items.iter().map(|i| i.line_total().unwrap()).sum();
        assert_eq!(items_sum, plan.total);
        assert_eq!(plan.address_id, AddressId::new(3));
        assert_eq!(plan.consumed, vec![CartLineId::new(1), CartLineId::new(2)]);
        assert_eq!(plan.status, OrderStatus::Ordered);
        assert_eq!(plan.payment_method, PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_decimal_prices_do_not_drift() {
        let mut a = line(1, 10, 0, 3);
        a.price = Decimal::new(10, 2); // 0.10
        let plan = CheckoutPlan::build(UserId::new(7), &[a], Some(&address())).unwrap();
        assert_eq!(plan.total, Decimal::new(30, 2));
    }

    #[test]
    fn test_overflowing_line_total_is_an_error() {
        let mut a = line(1, 10, 0, 1_000_000);
        a.price = Decimal::from_i128_with_scale(10_i128.pow(25), 0);
        let err = CheckoutPlan::build(UserId::new(7), &[a], Some(&address())).unwrap_err();
        assert!(matches!(err, CheckoutError::TotalTooLarge));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_total_above_column_bound_is_an_error() {
        let mut a = line(1, 10, 0, 1);
        a.price = MAX_PRICE;
        let plan = CheckoutPlan::build(UserId::new(7), &[a.clone()], Some(&address())).unwrap();
        assert_eq!(plan.total, MAX_PRICE);

        let b = line(2, 11, 1, 1);
        let err = CheckoutPlan::build(UserId::new(7), &[a, b], Some(&address())).unwrap_err();
        assert!(matches!(err, CheckoutError::TotalTooLarge));
    }

    #[test]
    fn test_empty_cart_checked_before_address() {
        let err = CheckoutPlan::build(UserId::new(7), &[], None).unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[test]
    fn test_missing_address() {
        let err = CheckoutPlan::build(UserId::new(7), &[line(1, 10, 1, 1)], None).unwrap_err();
        assert!(matches!(err, CheckoutError::NoAddress));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(CheckoutError::EmptyCart.kind(), ErrorKind::EmptyCart);
        assert_eq!(CheckoutError::NoAddress.kind(), ErrorKind::NoAddress);
        assert_eq!(
            CheckoutError::LineNotFound(ProductId::new(1)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CheckoutError::Repository(RepositoryError::Timeout).kind(),
            ErrorKind::DeadlineExceeded
        );
    }
}
