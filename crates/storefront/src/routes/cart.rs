//! Cart route handlers.
//!
//! The user always comes from the access token; the product from `?id=`.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use bazaar_core::ProductId;

use crate::error::{AppQuery, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// `?id=<product>`.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub id: ProductId,
}

/// `?id=<product>&qty=<quantity>`.
#[derive(Debug, Deserialize)]
pub struct QuantityQuery {
    pub id: ProductId,
    pub qty: i32,
}

/// Add one unit of a product.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    AppQuery(query): AppQuery<ProductQuery>,
) -> Result<Json<Value>> {
    state.cart().add_to_cart(claims.sub, query.id).await?;
    Ok(Json(json!({ "message": "Product added to cart" })))
}

/// Remove a product's line.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    AppQuery(query): AppQuery<ProductQuery>,
) -> Result<Json<Value>> {
    state.cart().remove_from_cart(claims.sub, query.id).await?;
    Ok(Json(json!({ "message": "Product removed from cart" })))
}

/// The caller's cart lines.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<Json<Value>> {
    let lines = state.cart().get_cart_items(claims.sub).await?;
    Ok(Json(json!({ "cartItems": lines })))
}

/// Set the quantity of an existing line.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn update_quantity(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    AppQuery(query): AppQuery<QuantityQuery>,
) -> Result<Json<Value>> {
    let line = state
        .cart()
        .update_quantity(claims.sub, query.id, query.qty)
        .await?;
    Ok(Json(json!({ "message": "Quantity updated", "data": line })))
}

/// Empty the cart.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<Json<Value>> {
    let removed = state.cart().clear_cart(claims.sub).await?;
    Ok(Json(json!({ "message": "Cart cleared", "removed": removed })))
}
