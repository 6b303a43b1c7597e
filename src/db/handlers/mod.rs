//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, provides
//! strongly-typed CRUD operations, and returns record structs from
//! [`crate::db::models`]. Most implement the [`Repository`] trait;
//! [`ExchangeRates`] is keyed by currency pair instead of id and exposes
//! pair-oriented methods directly.

pub mod categories;
pub mod exchange_rates;
pub mod orders;
pub mod products;
pub mod repository;
pub mod services;
pub mod transfers;
pub mod users;

pub use categories::Categories;
pub use exchange_rates::ExchangeRates;
pub use orders::Orders;
pub use products::Products;
pub use repository::Repository;
pub use services::Services;
pub use transfers::Transfers;
pub use users::Users;
