//! Authentication service.
//!
//! Provides password signup and login, and issues the signed tokens that
//! identify callers on every other route.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenKind, TokenPair, TokenSigner};

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;

use bazaar_core::{Email, Phone, UserId, UserRole};

use super::deadline::with_deadline;
use crate::config::StorefrontConfig;
use crate::db::{Datastore, RepositoryError};
use crate::models::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Signup form.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Login form.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authentication service.
///
/// Handles user registration, login and token refresh.
pub struct AuthService<'a> {
    store: &'a dyn Datastore,
    signer: &'a TokenSigner,
    config: &'a StorefrontConfig,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        store: &'a dyn Datastore,
        signer: &'a TokenSigner,
        config: &'a StorefrontConfig,
    ) -> Self {
        Self {
            store,
            signer,
            config,
        }
    }

    const fn timeout(&self) -> Duration {
        self.config.db_timeout
    }

    /// Register a new user and issue their tokens.
    ///
    /// Emails listed in `STOREFRONT_ADMIN_EMAILS` get the admin role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `InvalidPhone`, `InvalidName` or
    /// `WeakPassword` for bad input, and `AuthError::UserAlreadyExists` if
    /// the email or phone is already registered.
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &SignupRequest) -> Result<(User, TokenPair), AuthError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AuthError::InvalidName);
        }
        let email = Email::parse(&request.email)?;
        let phone = Phone::parse(&request.phone)?;
        validate_password(&request.password)?;

        let password_hash = hash_password(&request.password)?;
        let role = if self.config.is_admin_email(&email) {
            UserRole::Admin
        } else {
            UserRole::User
        };
        let new_user = NewUser {
            name: name.to_owned(),
            email,
            phone,
            role,
        };

        let user = with_deadline(
            self.timeout(),
            self.store.create_user(&new_user, &password_hash),
        )
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(msg) => AuthError::UserAlreadyExists(msg),
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        let tokens = self.signer.issue_pair(&user)?;
        Ok((user, tokens))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<(User, TokenPair), AuthError> {
        let email = Email::parse(&request.email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) =
            with_deadline(self.timeout(), self.store.get_password_hash(&email))
                .await?
                .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&request.password, &password_hash)?;

        let tokens = self.signer.issue_pair(&user)?;
        Ok((user, tokens))
    }

    /// Exchange a refresh token for a fresh pair.
    ///
    /// The user is re-read so role changes take effect.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for a bad refresh token and
    /// `AuthError::UserNotFound` if the user no longer exists.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.signer.verify(refresh_token, TokenKind::Refresh)?;
        let user = self.get_user(claims.sub).await?;
        self.signer.issue_pair(&user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        with_deadline(self.timeout(), self.store.get_user(user_id))
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use secrecy::SecretString;

    use super::*;
    use crate::config::TokenConfig;
    use crate::db::MemoryDatastore;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("memory:"),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            db_timeout: Duration::from_secs(5),
            token_secret: SecretString::from("k9$Qm2!vX7@pL4#wZ8&rT1*uY5^nB3%e"),
            tokens: TokenConfig::default(),
            admin_emails: vec![Email::parse("boss@example.com").unwrap()],
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    fn signup(email: &str, phone: &str) -> SignupRequest {
        SignupRequest {
            name: "Zara".to_owned(),
            email: email.to_owned(),
            phone: phone.to_owned(),
            password: "correct horse".to_owned(),
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("hunter22!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22!", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter23!", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryDatastore::new();
        let config = config();
        let signer = TokenSigner::new(config.token_secret.clone(), config.tokens);
        let auth = AuthService::new(&store, &signer, &config);

        let (user, tokens) = auth
            .register(&signup("Zara@Example.com", "+923004445566"))
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "zara@example.com");
        assert_eq!(user.role, UserRole::User);
        assert_eq!(
            signer.verify(&tokens.token, TokenKind::Access).unwrap().sub,
            user.id
        );

        let (again, _) = auth
            .login(&LoginRequest {
                email: "zara@example.com".to_owned(),
                password: "correct horse".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(again.id, user.id);

        let err = auth
            .login(&LoginRequest {
                email: "zara@example.com".to_owned(),
                password: "wrong horse".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let store = MemoryDatastore::new();
        let config = config();
        let signer = TokenSigner::new(config.token_secret.clone(), config.tokens);
        let auth = AuthService::new(&store, &signer, &config);

        auth.register(&signup("a@example.com", "+923000000001"))
            .await
            .unwrap();
        let err = auth
            .register(&signup("a@example.com", "+923000000002"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists(ref m) if m.contains("email")));
    }

    #[tokio::test]
    async fn test_admin_email_gets_admin_role() {
        let store = MemoryDatastore::new();
        let config = config();
        let signer = TokenSigner::new(config.token_secret.clone(), config.tokens);
        let auth = AuthService::new(&store, &signer, &config);

        let (user, tokens) = auth
            .register(&signup("boss@example.com", "+923000000003"))
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Admin);

        let refreshed = auth.refresh(&tokens.refresh_token).await.unwrap();
        assert!(
            signer
                .verify(&refreshed.token, TokenKind::Access)
                .unwrap()
                .is_admin()
        );
    }
}
