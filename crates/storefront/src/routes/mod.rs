//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                            - Welcome message
//! GET    /health                      - Liveness check
//! GET    /health/ready                - Readiness check (datastore ping)
//!
//! # Catalog (public)
//! GET    /get-products                - All products
//! GET    /get-product/{id}            - One product
//! GET    /search-products?product=    - Products whose name contains the query
//! GET    /get-categories              - All categories
//!
//! # Auth
//! POST   /signup                      - Create an account, returns a token pair
//! POST   /login                       - Exchange credentials for a token pair
//! POST   /refresh                     - Exchange a refresh token
//! GET    /user                        - Caller's profile (requires auth)
//!
//! # Cart (requires auth)
//! GET    /addtocart?id=               - Add one unit of a product
//! GET    /removefromcart?id=          - Drop a product's line
//! GET    /listcart                    - Caller's cart lines
//! GET    /updatequantity?id=&qty=     - Set a line's quantity
//! GET    /clearcart                   - Empty the cart
//!
//! # Checkout (requires auth)
//! GET    /cartcheckout                - Order the whole cart
//! GET    /instantbuy?id=              - Order a single cart line
//! GET    /orders                      - Caller's orders
//!
//! # Addresses (requires auth)
//! POST   /addaddress                  - Add a shipping address
//! GET    /addresses                   - List addresses, newest first
//! PUT    /editaddress/{id}            - Replace an address
//! DELETE /deleteaddress/{id}          - Delete an address
//!
//! # Admin (requires the admin role)
//! POST   /admin/add-products          - Create a product
//! GET    /admin/get-products          - All products (204 when empty)
//! GET    /admin/get-product/{id}      - One product
//! PUT    /admin/update-product/{id}   - Replace a product
//! DELETE /admin/delete-product/{id}   - Delete a product
//! POST   /admin/add-category          - Create a category
//! ```

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/add-products", post(admin::add_product))
        .route("/get-products", get(admin::list_products))
        .route("/get-product/{id}", get(admin::get_product))
        .route("/update-product/{id}", put(admin::update_product))
        .route("/delete-product/{id}", delete(admin::delete_product))
        .route("/add-category", post(admin::add_category))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        // Catalog
        .route("/get-products", get(products::index))
        .route("/get-product/{id}", get(products::show))
        .route("/search-products", get(products::search))
        .route("/get-categories", get(products::categories))
        // Auth
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/user", get(auth::me))
        // Cart
        .route("/addtocart", get(cart::add))
        .route("/removefromcart", get(cart::remove))
        .route("/listcart", get(cart::list))
        .route("/updatequantity", get(cart::update_quantity))
        .route("/clearcart", get(cart::clear))
        // Checkout and orders
        .route("/cartcheckout", get(checkout::cart_checkout))
        .route("/instantbuy", get(checkout::instant_buy))
        .route("/orders", get(checkout::orders))
        // Addresses
        .route("/addaddress", post(addresses::create))
        .route("/addresses", get(addresses::index))
        .route("/editaddress/{id}", put(addresses::update))
        .route("/deleteaddress/{id}", delete(addresses::destroy))
        // Admin
        .nest("/admin", admin_routes())
}

/// Build the full application: routes, health checks and middleware.
///
/// Layers, outermost first: Sentry hub and transaction, request tracing,
/// request id.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Bazaar API" }))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the datastore is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
