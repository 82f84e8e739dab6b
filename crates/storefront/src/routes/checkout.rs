//! Checkout and order history route handlers.

use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppQuery, Result};
use crate::middleware::RequireAuth;
use crate::models::OrderDetails;
use crate::routes::cart::ProductQuery;
use crate::state::AppState;

fn receipt(message: &str, details: &OrderDetails) -> Json<Value> {
    Json(json!({
        "message": message,
        "price": details.order.total_price,
        "data": details,
    }))
}

/// Order everything in the caller's cart.
///
/// Any `?id=` is ignored; the user is the token's subject.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn cart_checkout(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<Json<Value>> {
    let details = state.orders().checkout(claims.sub).await?;
    Ok(receipt("Cart checked out", &details))
}

/// Order one product's cart line.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn instant_buy(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    AppQuery(query): AppQuery<ProductQuery>,
) -> Result<Json<Value>> {
    let details = state.orders().instant_buy(claims.sub, query.id).await?;
    Ok(receipt("Product ordered", &details))
}

/// The caller's orders, newest first.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<Json<Value>> {
    let orders = state.orders().list_orders(claims.sub).await?;
    Ok(Json(json!({ "orders": orders })))
}
