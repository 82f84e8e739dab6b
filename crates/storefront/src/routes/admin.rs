//! Admin route handlers.
//!
//! Every handler takes [`RequireAdmin`], so callers without the admin role
//! get 403 before anything is read.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::instrument;

use bazaar_core::ProductId;

use crate::error::{AppJson, AppPath, Result};
use crate::middleware::RequireAdmin;
use crate::models::{CategoryInput, ProductInput};
use crate::state::AppState;

/// Create a product.
#[instrument(skip(state, admin, input), fields(admin_id = %admin.sub))]
pub async fn add_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppJson(input): AppJson<ProductInput>,
) -> Result<(StatusCode, Json<Value>)> {
    let product = state.catalog().create_product(&input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": product }))))
}

/// List every product. Answers 204 when the catalog is empty.
#[instrument(skip(state, _admin))]
pub async fn list_products(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Response> {
    let products = state.catalog().list_products().await?;
    if products.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(json!({ "products": products })).into_response())
}

/// Show one product.
#[instrument(skip(state, _admin))]
pub async fn get_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    AppPath(id): AppPath<ProductId>,
) -> Result<Json<Value>> {
    let product = state.catalog().get_product(id).await?;
    Ok(Json(json!({ "product": product })))
}

/// Overwrite a product.
#[instrument(skip(state, admin, input), fields(admin_id = %admin.sub))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppPath(id): AppPath<ProductId>,
    AppJson(input): AppJson<ProductInput>,
) -> Result<Json<Value>> {
    let product = state.catalog().update_product(id, &input).await?;
    Ok(Json(json!({
        "message": "Product updated successfully",
        "data": product,
    })))
}

/// Delete a product. 404 when absent, 409 when it appears on an order.
#[instrument(skip(state, admin), fields(admin_id = %admin.sub))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppPath(id): AppPath<ProductId>,
) -> Result<Json<Value>> {
    state.catalog().delete_product(id).await?;
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

/// Create a category.
#[instrument(skip(state, admin, input), fields(admin_id = %admin.sub))]
pub async fn add_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppJson(input): AppJson<CategoryInput>,
) -> Result<(StatusCode, Json<Value>)> {
    let category = state.catalog().create_category(&input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": category }))))
}
