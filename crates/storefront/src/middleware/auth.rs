//! Authentication extractors.
//!
//! Callers identify themselves with an access token in either the `token`
//! header or `Authorization: Bearer <token>`. A missing or invalid token is
//! rejected with 401 before the handler runs.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::services::auth::{Claims, TokenKind};
use crate::state::AppState;

/// Header carrying a bare access token.
pub const TOKEN_HEADER: &str = "token";

/// Extractor that requires a valid access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(claims): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", claims.name)
/// }
/// ```
pub struct RequireAuth(pub Claims);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing token".to_owned()))?;

        let claims = state.signer().verify(token, TokenKind::Access)?;

        tracing::Span::current().record("user_id", claims.sub.as_i64());
        crate::error::set_sentry_user(&claims.sub, Some(&claims.email));

        Ok(Self(claims))
    }
}

/// Extractor that requires a valid access token with the admin role.
pub struct RequireAdmin(pub Claims);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(claims) = RequireAuth::from_request_parts(parts, state).await?;
        if !claims.is_admin() {
            tracing::warn!(user_id = %claims.sub, path = %parts.uri.path(), "Non-admin hit admin route");
            return Err(AppError::Forbidden("admin role required".to_owned()));
        }
        Ok(Self(claims))
    }
}

/// The token from the `token` header, else from `Authorization: Bearer`.
fn bearer_token(parts: &Parts) -> Option<&str> {
    if let Some(token) = parts
        .headers
        .get(TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|t| !t.trim().is_empty())
    {
        return Some(token.trim());
    }

    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/listcart");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_token_header_preferred() {
        let p = parts(&[("token", "abc"), ("authorization", "Bearer xyz")]);
        assert_eq!(bearer_token(&p), Some("abc"));
    }

    #[test]
    fn test_bearer_fallback() {
        let p = parts(&[("authorization", "Bearer xyz")]);
        assert_eq!(bearer_token(&p), Some("xyz"));
    }

    #[test]
    fn test_missing_or_malformed() {
        assert_eq!(bearer_token(&parts(&[])), None);
        assert_eq!(bearer_token(&parts(&[("authorization", "Basic Zm9v")])), None);
        assert_eq!(bearer_token(&parts(&[("token", "  ")])), None);
    }
}
