//! Signed bearer tokens.
//!
//! A token is `base64url(claims_json) "." base64url(hmac_sha256(claims_json))`,
//! both parts unpadded. Access and refresh tokens share the format and are
//! told apart by the `typ` claim.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use bazaar_core::{UserId, UserRole};

use super::AuthError;
use crate::config::TokenConfig;
use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Identity claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    pub typ: TokenKind,
}

impl Claims {
    /// Whether the bearer has the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// An access token and its refresh token.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// Issues and verifies tokens with one HMAC key.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
    ttl: TokenConfig,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer.
    #[must_use]
    pub const fn new(secret: SecretString, ttl: TokenConfig) -> Self {
        Self { secret, ttl }
    }

    /// Issue an access and refresh token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the claims cannot be signed.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            token: self.issue(user, TokenKind::Access)?,
            refresh_token: self.issue(user, TokenKind::Refresh)?,
        })
    }

    /// Issue a single token of `kind` for `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the claims cannot be signed.
    pub fn issue(&self, user: &User, kind: TokenKind) -> Result<String, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.ttl.access_ttl,
            TokenKind::Refresh => self.ttl.refresh_ttl,
        };
        let claims = Claims {
            sub: user.id,
            email: user.email.as_str().to_owned(),
            name: user.name.clone(),
            role: user.role,
            exp: expiry(ttl),
            typ: kind,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(claims)
            .map_err(|e| AuthError::Token(format!("cannot encode claims: {e}")))?;
        let mut mac = self.mac()?;
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verify a token's signature, expiry and kind.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is malformed, forged,
    /// of the wrong kind, or expired.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let (payload_b64, signature_b64) =
            token.trim().split_once('.').ok_or(AuthError::InvalidToken)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::InvalidToken)?;

        let mut mac = self.mac()?;
        mac.update(&payload);
        // Constant-time comparison
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidToken)?;
        if claims.typ != expected || claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| AuthError::Token(e.to_string()))
    }
}

fn expiry(ttl: Duration) -> i64 {
    let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    Utc::now().timestamp().saturating_add(secs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{Email, Phone};

    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(
            SecretString::from("k9$Qm2!vX7@pL4#wZ8&rT1*uY5^nB3%e"),
            TokenConfig::default(),
        )
    }

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(42),
            name: "Hamza".to_owned(),
            email: Email::parse("hamza@example.com").unwrap(),
            phone: Phone::parse("+923001112233").unwrap(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = signer();
        let pair = signer.issue_pair(&user()).unwrap();

        let claims = signer.verify(&pair.token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, UserId::new(42));
        assert_eq!(claims.email, "hamza@example.com");
        assert!(!claims.is_admin());

        let refresh = signer.verify(&pair.refresh_token, TokenKind::Refresh).unwrap();
        assert!(refresh.exp > claims.exp);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let signer = signer();
        let pair = signer.issue_pair(&user()).unwrap();
        assert!(signer.verify(&pair.refresh_token, TokenKind::Access).is_err());
        assert!(signer.verify(&pair.token, TokenKind::Refresh).is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let signer = signer();
        let token = signer.issue(&user(), TokenKind::Access).unwrap();
        let (_, sig) = token.split_once('.').unwrap();

        let mut claims = signer.verify(&token, TokenKind::Access).unwrap();
        claims.role = UserRole::Admin;
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let forged = format!("{forged_payload}.{sig}");

        assert!(matches!(
            signer.verify(&forged, TokenKind::Access),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_other_key_rejected() {
        let token = signer().issue(&user(), TokenKind::Access).unwrap();
        let other = TokenSigner::new(
            SecretString::from("Zx8#Lm3$Qp7!Vr2@Nt6&Wb1*Ky5^Hc9%"),
            TokenConfig::default(),
        );
        assert!(other.verify(&token, TokenKind::Access).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = TokenSigner::new(
            SecretString::from("k9$Qm2!vX7@pL4#wZ8&rT1*uY5^nB3%e"),
            TokenConfig {
                access_ttl: Duration::ZERO,
                refresh_ttl: Duration::ZERO,
            },
        );
        let token = signer.issue(&user(), TokenKind::Access).unwrap();
        assert!(signer.verify(&token, TokenKind::Access).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let signer = signer();
        for token in ["", "abc", "a.b", "!!!.???"] {
            assert!(signer.verify(token, TokenKind::Access).is_err());
        }
    }
}
