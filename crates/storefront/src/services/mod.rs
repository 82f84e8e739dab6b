//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Signup, login and token issuance
//! - `cart` - Cart line operations
//! - `orders` - Checkout and order history
//! - `addresses` - Shipping address book
//! - `catalog` - Categories and products
//!
//! Every service borrows the shared `Datastore` and applies the configured
//! deadline to each call it makes (see [`deadline`]).

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod deadline;
pub mod orders;

pub use addresses::{AddressError, AddressService};
pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use catalog::{CatalogError, CatalogService};
pub use orders::OrderService;
