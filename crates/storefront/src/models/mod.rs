//! Domain models for the storefront.
//!
//! These are the validated types handed between the datastore, the services
//! and the JSON responses. Database row types stay private to `db::postgres`.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use address::{Address, AddressInput};
pub use cart::{CartLine, MAX_LINE_QUANTITY};
pub use catalog::{Category, CategoryInput, MAX_PRICE, Product, ProductInput};
pub use order::{Order, OrderDetails, OrderItem, Payment};
pub use user::{NewUser, User};
