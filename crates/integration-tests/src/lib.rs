//! Integration tests for Bazaar.
//!
//! The HTTP tests build the full storefront router over a fresh in-memory
//! datastore and drive it with `tower::ServiceExt::oneshot`. No database
//! or network is needed:
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! # Test Files
//!
//! - `auth_flow` - Signup, login, refresh and token checks
//! - `catalog` - Public catalog and admin product management
//! - `cart_flow` - Cart line operations
//! - `checkout_flow` - Checkout, instant buy and addresses
//! - `postgres_store` - `PostgreSQL` datastore transactions and queries
//!   (ignored by default; run with `-- --ignored` against a live database)

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header::CONTENT_TYPE};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use bazaar_core::Email;
use bazaar_storefront::config::{StorefrontConfig, TokenConfig};
use bazaar_storefront::db::{MEMORY_URL, MemoryDatastore};
use bazaar_storefront::routes;
use bazaar_storefront::state::AppState;

/// Email that signs up with the admin role.
pub const ADMIN_EMAIL: &str = "admin@bazaar.test";

/// A storefront wired to its own in-memory datastore.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let config = StorefrontConfig {
            database_url: SecretString::from(MEMORY_URL),
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            db_timeout: Duration::from_secs(5),
            token_secret: SecretString::from("k9#Tq2!vXz7@Lm4$Wr8^Bn3&Hs6*Pd1Ye"),
            tokens: TokenConfig::default(),
            admin_emails: vec![Email::parse(ADMIN_EMAIL).unwrap()],
            sentry_dsn: None,
            sentry_environment: None,
        };
        let state = AppState::new(config, Arc::new(MemoryDatastore::new()));
        Self {
            router: routes::app(state),
        }
    }

    /// Send a request and return the status and the JSON body
    /// (`Value::Null` when the body is empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("token", token);
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    // =========================================================================
    // Fixtures
    // =========================================================================

    /// Sign up and return the access token.
    pub async fn signup(&self, name: &str, email: &str, phone: &str) -> String {
        let (status, body) = self
            .post(
                "/signup",
                None,
                json!({
                    "name": name,
                    "email": email,
                    "phone": phone,
                    "password": "correct horse battery",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        body["token"].as_str().unwrap().to_owned()
    }

    /// Sign up the admin account and return its access token.
    pub async fn admin_token(&self) -> String {
        self.signup("Admin", ADMIN_EMAIL, "+1 555 000 0001").await
    }

    /// Create a category and return its id.
    pub async fn create_category(&self, admin: &str, slug: &str) -> i64 {
        let (status, body) = self
            .post(
                "/admin/add-category",
                Some(admin),
                json!({ "name": slug, "slug": slug }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add-category failed: {body}");
        body["data"]["id"].as_i64().unwrap()
    }

    /// Create a product and return its id. `price` is a decimal string.
    pub async fn create_product(&self, admin: &str, category: i64, name: &str, price: &str) -> i64 {
        let (status, body) = self
            .post(
                "/admin/add-products",
                Some(admin),
                json!({
                    "category_id": category,
                    "name": name,
                    "price": price,
                    "quantity": 10,
                    "rating": 4,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add-products failed: {body}");
        body["data"]["id"].as_i64().unwrap()
    }

    /// Add a shipping address for the caller and return its id.
    pub async fn add_address(&self, token: &str, city: &str) -> i64 {
        let (status, body) = self
            .post(
                "/addaddress",
                Some(token),
                json!({
                    "street": "12 Canal Street",
                    "city": city,
                    "state": "Sindh",
                    "country": "PK",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "addaddress failed: {body}");
        body["data"]["id"].as_i64().unwrap()
    }
}
