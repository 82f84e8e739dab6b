//! Address book route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::instrument;

use bazaar_core::AddressId;

use crate::error::{AppJson, AppPath, Result};
use crate::middleware::RequireAuth;
use crate::models::AddressInput;
use crate::state::AppState;

/// Add a shipping address.
#[instrument(skip(state, claims, input), fields(user_id = %claims.sub))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    AppJson(input): AppJson<AddressInput>,
) -> Result<(StatusCode, Json<Value>)> {
    let address = state.addresses().add(claims.sub, &input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": address }))))
}

/// The caller's addresses, newest first.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<Json<Value>> {
    let addresses = state.addresses().list(claims.sub).await?;
    Ok(Json(json!({ "addresses": addresses })))
}

/// Replace an address the caller owns.
#[instrument(skip(state, claims, input), fields(user_id = %claims.sub))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    AppPath(id): AppPath<AddressId>,
    AppJson(input): AppJson<AddressInput>,
) -> Result<Json<Value>> {
    let address = state.addresses().update(id, claims.sub, &input).await?;
    Ok(Json(json!({
        "message": "Address updated successfully",
        "data": address,
    })))
}

/// Delete an address the caller owns.
#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    AppPath(id): AppPath<AddressId>,
) -> Result<Json<Value>> {
    state.addresses().delete(id, claims.sub).await?;
    Ok(Json(json!({ "message": "Address deleted successfully" })))
}
