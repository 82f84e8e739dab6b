//! Orders, order items and payments.
//!
//! `place_order` is the only multi-statement write in the storefront. It runs
//! in one transaction; dropping the transaction on any error rolls back every
//! write, so a failed checkout leaves the cart and order tables untouched.
//!
//! Concurrent checkouts for one user are serialized by a transaction-scoped
//! advisory lock keyed on the user id, and the cart rows being consumed are
//! additionally locked with `FOR UPDATE`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};

use bazaar_core::{
    AddressId, OrderId, OrderItemId, OrderStatus, PaymentId, PaymentMethod, ProductId, UserId,
};

use super::PgDatastore;
use super::addresses::{ADDRESS_COLUMNS, AddressRow};
use super::cart::{CART_LINE_COLUMNS, CartLineRow};
use crate::checkout::{CheckoutError, CheckoutPlan, CheckoutScope};
use crate::db::{OrderStore, RepositoryError};
use crate::models::{Address, CartLine, Order, OrderDetails, OrderItem, Payment};

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    address_id: AddressId,
    total_price: Decimal,
    status: String,
    payment_method: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;
        let payment_method = parse_payment_method(&row.payment_method)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            address_id: row.address_id,
            total_price: row.total_price,
            status,
            payment_method,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: PaymentId,
    order_id: OrderId,
    amount: Decimal,
    payment_method: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            amount: row.amount,
            payment_method: parse_payment_method(&row.payment_method)?,
            created_at: row.created_at,
        })
    }
}

fn parse_payment_method(s: &str) -> Result<PaymentMethod, RepositoryError> {
    s.parse().map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid payment method in database: {e}"))
    })
}

const ORDER_COLUMNS: &str =
    "id, user_id, address_id, total_price, status, payment_method, created_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price";
const PAYMENT_COLUMNS: &str = "id, order_id, amount, payment_method, created_at";

// =============================================================================
// Checkout steps
// =============================================================================

async fn lock_lines(
    tx: &mut Transaction<'_, Postgres>,
    user: UserId,
    scope: CheckoutScope,
) -> Result<Vec<CartLine>, CheckoutError> {
    let rows = match scope {
        CheckoutScope::WholeCart => {
            sqlx::query_as::<_, CartLineRow>(&format!(
                "SELECT {CART_LINE_COLUMNS} FROM bazaar.cart_line \
                 WHERE user_id = $1 ORDER BY id FOR UPDATE"
            ))
            .bind(user)
            .fetch_all(&mut **tx)
            .await?
        }
        CheckoutScope::SingleLine(product) => {
            let row = sqlx::query_as::<_, CartLineRow>(&format!(
                "SELECT {CART_LINE_COLUMNS} FROM bazaar.cart_line \
                 WHERE user_id = $1 AND product_id = $2 FOR UPDATE"
            ))
            .bind(user)
            .bind(product)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(CheckoutError::LineNotFound(product))?;
            vec![row]
        }
    };

    Ok(rows.into_iter().map(Into::into).collect())
}

async fn write_plan(
    tx: &mut Transaction<'_, Postgres>,
    plan: &CheckoutPlan,
) -> Result<OrderDetails, CheckoutError> {
    let order: Order = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO bazaar.order (user_id, address_id, total_price, status, payment_method) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(plan.user_id)
    .bind(plan.address_id)
    .bind(plan.total)
    .bind(plan.status.as_str())
    .bind(plan.payment_method.as_str())
    .fetch_one(&mut **tx)
    .await?
    .try_into()?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(plan.items.len());
    for item in &plan.items {
        let row = sqlx::query_as::<_, OrderItemRow>(&format!(
            "INSERT INTO bazaar.order_item (order_id, product_id, quantity, price) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ORDER_ITEM_COLUMNS}"
        ))
        .bind(order.id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .fetch_one(&mut **tx)
        .await?;
        items.push(row.into());
    }

    let payment: Payment = sqlx::query_as::<_, PaymentRow>(&format!(
        "INSERT INTO bazaar.payment (order_id, amount, payment_method) \
         VALUES ($1, $2, $3) \
         RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(order.id)
    .bind(plan.total)
    .bind(plan.payment_method.as_str())
    .fetch_one(&mut **tx)
    .await?
    .try_into()?;

    let consumed: Vec<i64> = plan.consumed.iter().map(|id| id.as_i64()).collect();
    sqlx::query("DELETE FROM bazaar.cart_line WHERE id = ANY($1)")
        .bind(&consumed)
        .execute(&mut **tx)
        .await?;

    Ok(OrderDetails {
        order,
        items,
        payment,
    })
}

#[async_trait]
impl OrderStore for PgDatastore {
    #[tracing::instrument(skip(self))]
    async fn place_order(
        &self,
        user: UserId,
        scope: CheckoutScope,
    ) -> Result<OrderDetails, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(user)
            .execute(&mut *tx)
            .await?;

        let lines = lock_lines(&mut tx, user, scope).await?;
        let address: Option<Address> = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM bazaar.address \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        ))
        .bind(user)
        .fetch_optional(&mut *tx)
        .await?
        .map(Into::into);

        let plan = CheckoutPlan::build(user, &lines, address.as_ref())?;
        let details = write_plan(&mut tx, &plan).await?;

        tx.commit().await?;
        Ok(details)
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<OrderDetails>, RepositoryError> {
        let orders: Vec<Order> = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM bazaar.order \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect::<Result<_, _>>()?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();

        let mut items: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM bazaar.order_item \
             WHERE order_id = ANY($1) ORDER BY id"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for row in item_rows {
            items.entry(row.order_id).or_default().push(row.into());
        }

        let mut payments: HashMap<OrderId, Payment> = HashMap::new();
        let payment_rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM bazaar.payment WHERE order_id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for row in payment_rows {
            let payment = Payment::try_from(row)?;
            payments.insert(payment.order_id, payment);
        }

        orders
            .into_iter()
            .map(|order| {
                let payment = payments.remove(&order.id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!("order {} has no payment", order.id))
                })?;
                Ok(OrderDetails {
                    items: items.remove(&order.id).unwrap_or_default(),
                    payment,
                    order,
                })
            })
            .collect()
    }
}
