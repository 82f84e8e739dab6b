//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar admin promote -e owner@example.com
//! ```
//!
//! The user must already have signed up. Tokens issued before promotion keep
//! the old role until they expire; the user has to log in again.

use bazaar_core::Email;
use bazaar_storefront::db::{self, PgDatastore, RepositoryError, UserStore};

use super::{CliError, database_url};

/// Grant the admin role to the user with `email`.
///
/// # Errors
///
/// Returns `CliError::InvalidEmail` for a malformed address and
/// `CliError::UserNotFound` if nobody has signed up with it.
pub async fn promote(email: &str) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let store = PgDatastore::new(db::create_pool(&database_url).await?);

    let user = match store.promote_to_admin(&email).await {
        Ok(user) => user,
        Err(RepositoryError::NotFound) => {
            return Err(CliError::UserNotFound(email.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, email = %user.email, "User promoted to admin");
    Ok(())
}
