//! Public catalog route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use bazaar_core::ProductId;

use crate::error::{AppPath, AppQuery, Result};
use crate::state::AppState;

/// Query for `/search-products`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub product: String,
}

/// List every product.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Value>> {
    let products = state.catalog().list_products().await?;
    Ok(Json(json!({ "data": products })))
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<ProductId>,
) -> Result<Json<Value>> {
    let product = state.catalog().get_product(id).await?;
    Ok(Json(json!({ "product": product })))
}

/// Products whose name contains `?product=`, ignoring case.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> Result<Json<Value>> {
    let products = state.catalog().search_products(&query.product).await?;
    Ok(Json(json!({ "data": products })))
}

/// List every category.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Value>> {
    let categories = state.catalog().list_categories().await?;
    Ok(Json(json!({ "categories": categories })))
}
