//! Shipping address book.

use std::time::Duration;

use thiserror::Error;

use bazaar_core::{AddressId, UserId};

use super::deadline::with_deadline;
use crate::db::{Datastore, RepositoryError};
use crate::error::ErrorKind;
use crate::models::{Address, AddressInput};

/// Errors that can occur during address operations.
#[derive(Debug, Error)]
pub enum AddressError {
    /// A required field is blank.
    #[error("{0}")]
    InvalidInput(String),

    /// Address id is zero or negative.
    #[error("address id must be positive")]
    InvalidAddressId,

    /// No address with this id belongs to the user.
    #[error("address not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AddressError {
    /// Classify the error for the HTTP boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::InvalidAddressId => ErrorKind::InvalidArgument,
            Self::NotFound => ErrorKind::NotFound,
            Self::Repository(err) => err.kind(),
        }
    }
}

/// Address service.
pub struct AddressService<'a> {
    store: &'a dyn Datastore,
    timeout: Duration,
}

impl<'a> AddressService<'a> {
    /// Create a new address service.
    #[must_use]
    pub const fn new(store: &'a dyn Datastore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Add an address. Users may have any number of addresses.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::InvalidInput` for a blank field.
    #[tracing::instrument(skip(self, input))]
    pub async fn add(&self, user: UserId, input: &AddressInput) -> Result<Address, AddressError> {
        let input = input.normalized().map_err(AddressError::InvalidInput)?;
        let address = with_deadline(self.timeout, self.store.add_address(user, &input)).await?;
        tracing::info!(address_id = %address.id, "Address added");
        Ok(address)
    }

    /// The user's addresses, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Repository` if the datastore fails.
    pub async fn list(&self, user: UserId) -> Result<Vec<Address>, AddressError> {
        Ok(with_deadline(self.timeout, self.store.list_addresses(user)).await?)
    }

    /// Overwrite an address the user owns.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` if the address does not exist or
    /// belongs to another user.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: AddressId,
        user: UserId,
        input: &AddressInput,
    ) -> Result<Address, AddressError> {
        if !id.is_positive() {
            return Err(AddressError::InvalidAddressId);
        }
        let input = input.normalized().map_err(AddressError::InvalidInput)?;
        with_deadline(self.timeout, self.store.update_address(id, user, &input))
            .await?
            .ok_or(AddressError::NotFound)
    }

    /// Delete an address the user owns.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` if the address does not exist or
    /// belongs to another user.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: AddressId, user: UserId) -> Result<(), AddressError> {
        if !id.is_positive() {
            return Err(AddressError::InvalidAddressId);
        }
        let deleted = with_deadline(self.timeout, self.store.delete_address(id, user)).await?;
        if !deleted {
            return Err(AddressError::NotFound);
        }
        Ok(())
    }
}
