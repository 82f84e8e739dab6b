//! Categories and products.

use std::time::Duration;

use thiserror::Error;

use bazaar_core::ProductId;

use super::deadline::with_deadline;
use crate::db::{Datastore, RepositoryError};
use crate::error::ErrorKind;
use crate::models::{Category, CategoryInput, Product, ProductInput};

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// Product id is zero or negative.
    #[error("product id must be positive")]
    InvalidProductId,

    /// No product with this id.
    #[error("product not found")]
    ProductNotFound,

    /// The referenced category does not exist.
    #[error("category not found")]
    CategoryNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl CatalogError {
    /// Classify the error for the HTTP boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::InvalidProductId => ErrorKind::InvalidArgument,
            Self::ProductNotFound | Self::CategoryNotFound => ErrorKind::NotFound,
            Self::Repository(err) => err.kind(),
        }
    }
}

/// A missing foreign key on a product write means the category is unknown.
fn category_missing(e: RepositoryError) -> CatalogError {
    match e {
        RepositoryError::NotFound => CatalogError::CategoryNotFound,
        other => CatalogError::Repository(other),
    }
}

/// Catalog service.
pub struct CatalogService<'a> {
    store: &'a dyn Datastore,
    timeout: Duration,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(store: &'a dyn Datastore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidInput` for a blank name or malformed
    /// slug, and a `Conflict` repository error if the slug is taken.
    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, CatalogError> {
        input.validate().map_err(CatalogError::InvalidInput)?;
        Ok(with_deadline(self.timeout, self.store.create_category(input)).await?)
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the datastore fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(with_deadline(self.timeout, self.store.list_categories()).await?)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if the id is zero or unknown.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        if !id.is_positive() {
            return Err(CatalogError::ProductNotFound);
        }
        with_deadline(self.timeout, self.store.get_product(id))
            .await?
            .ok_or(CatalogError::ProductNotFound)
    }

    /// Every product, unpaginated.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the datastore fails.
    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(with_deadline(self.timeout, self.store.list_products()).await?)
    }

    /// Products whose name contains `query`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidInput` for a blank query.
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::InvalidInput(
                "search query cannot be empty".to_owned(),
            ));
        }
        Ok(with_deadline(self.timeout, self.store.search_products(query)).await?)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidInput` if validation fails and
    /// `CatalogError::CategoryNotFound` for an unknown category.
    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, CatalogError> {
        input.validate().map_err(CatalogError::InvalidInput)?;
        let product = with_deadline(self.timeout, self.store.create_product(input))
            .await
            .map_err(category_missing)?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Overwrite every field of a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if the product does not exist
    /// and `CatalogError::CategoryNotFound` for an unknown category.
    #[tracing::instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, CatalogError> {
        if !id.is_positive() {
            return Err(CatalogError::InvalidProductId);
        }
        input.validate().map_err(CatalogError::InvalidInput)?;
        with_deadline(self.timeout, self.store.update_product(id, input))
            .await
            .map_err(category_missing)?
            .ok_or(CatalogError::ProductNotFound)
    }

    /// Delete a product. Lines for it disappear from every cart.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if the product does not exist,
    /// and a `Conflict` repository error if it appears on an order.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        if !id.is_positive() {
            return Err(CatalogError::InvalidProductId);
        }
        let deleted = with_deadline(self.timeout, self.store.delete_product(id)).await?;
        if !deleted {
            return Err(CatalogError::ProductNotFound);
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }
}
