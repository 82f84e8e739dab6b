//! Authentication route handlers.
//!
//! Signup and login answer with the user and a token pair. The access token
//! goes in the `token` header (or `Authorization: Bearer`) on later calls.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppJson, Result};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::auth::{LoginRequest, SignupRequest, TokenPair};
use crate::state::AppState;

/// Body for `POST /refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

fn session_body(user: &User, tokens: &TokenPair) -> Json<Value> {
    Json(json!({
        "data": user,
        "token": tokens.token,
        "refresh_token": tokens.refresh_token,
    }))
}

/// Create an account.
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(request): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let (user, tokens) = state.auth().register(&request).await?;
    Ok((StatusCode::CREATED, session_body(&user, &tokens)))
}

/// Exchange email and password for a token pair.
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<Value>> {
    let (user, tokens) = state.auth().login(&request).await?;
    Ok(session_body(&user, &tokens))
}

/// Exchange a refresh token for a new pair.
#[instrument(skip(state, request))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(request): AppJson<RefreshRequest>,
) -> Result<Json<Value>> {
    let tokens = state.auth().refresh(&request.refresh_token).await?;
    Ok(Json(json!({
        "token": tokens.token,
        "refresh_token": tokens.refresh_token,
    })))
}

/// The caller's profile.
#[instrument(skip(state, claims))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<Json<Value>> {
    let user = state.auth().get_user(claims.sub).await?;
    Ok(Json(json!({ "data": user })))
}
