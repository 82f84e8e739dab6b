//! Shipping addresses.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bazaar_core::{AddressId, UserId};

use super::{PgDatastore, map_delete_error, map_write_error};
use crate::db::{AddressStore, RepositoryError};
use crate::models::{Address, AddressInput};

#[derive(Debug, sqlx::FromRow)]
pub(super) struct AddressRow {
    id: AddressId,
    user_id: UserId,
    street: String,
    city: String,
    state: String,
    country: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            street: row.street,
            city: row.city,
            state: row.state,
            country: row.country,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(super) const ADDRESS_COLUMNS: &str =
    "id, user_id, street, city, state, country, created_at, updated_at";

#[async_trait]
impl AddressStore for PgDatastore {
    async fn add_address(
        &self,
        user: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "INSERT INTO bazaar.address (user_id, street, city, state, country) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user)
        .bind(&input.street)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.country)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "address already exists"))?;

        Ok(row.into())
    }

    async fn list_addresses(&self, user: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM bazaar.address \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_address(
        &self,
        id: AddressId,
        user: UserId,
        input: &AddressInput,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "UPDATE bazaar.address \
             SET street = $3, city = $4, state = $5, country = $6, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(user)
        .bind(&input.street)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.country)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete_address(&self, id: AddressId, user: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM bazaar.address WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user)
            .execute(&self.pool)
            .await
            .map_err(|e| map_delete_error(e, "address"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn latest_address(&self, user: UserId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM bazaar.address \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        ))
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
