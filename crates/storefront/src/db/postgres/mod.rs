//! `PostgreSQL` datastore.
//!
//! Queries are built at runtime with `sqlx::query_as` and decoded into private
//! `FromRow` row types, which are then converted into the domain models.
//! Checkout runs in a single transaction (see [`orders`]).

mod addresses;
mod cart;
mod catalog;
mod orders;
mod users;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Datastore, RepositoryError};

/// `Datastore` backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgDatastore {
    pool: PgPool,
}

impl PgDatastore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for migrations.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Datastore for PgDatastore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map unique and foreign-key violations to `Conflict`/`NotFound`.
///
/// `unique` names the message used for a unique violation; a foreign-key
/// violation means a referenced row is missing.
fn map_write_error(e: sqlx::Error, unique: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(unique.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(e)
}

/// Map a foreign-key violation on delete to `Conflict`.
fn map_delete_error(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict(format!("{what} is referenced by an order"));
    }
    RepositoryError::Database(e)
}
