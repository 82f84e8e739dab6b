//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::Datastore;
use crate::services::auth::TokenSigner;
use crate::services::{AddressService, AuthService, CartService, CatalogService, OrderService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the datastore, configuration and token signer.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn Datastore>,
    signer: TokenSigner,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Datastore opened at start-up
    #[must_use]
    pub fn new(config: StorefrontConfig, store: Arc<dyn Datastore>) -> Self {
        let signer = TokenSigner::new(config.token_secret.clone(), config.tokens);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                signer,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the datastore.
    #[must_use]
    pub fn store(&self) -> &dyn Datastore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the token signer.
    #[must_use]
    pub fn signer(&self) -> &TokenSigner {
        &self.inner.signer
    }

    // =========================================================================
    // Service constructors
    // =========================================================================

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.store(), self.signer(), self.config())
    }

    #[must_use]
    pub fn cart(&self) -> CartService<'_> {
        CartService::new(self.store(), self.inner.config.db_timeout)
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(self.store(), self.inner.config.db_timeout)
    }

    #[must_use]
    pub fn addresses(&self) -> AddressService<'_> {
        AddressService::new(self.store(), self.inner.config.db_timeout)
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.store(), self.inner.config.db_timeout)
    }
}
