//! HTTP request handlers.
//!
//! Handlers translate between the JSON surface and the repository layer:
//! extract and validate, acquire a connection, call the repository, convert
//! the result into an API model. Authorization happens here too, either via
//! the [`CurrentUser`](crate::api::models::users::CurrentUser) extractor or
//! the permission checks in [`crate::auth::permissions`].

pub mod auth;
pub mod categories;
pub mod exchange_rates;
pub mod orders;
pub mod products;
pub mod services;
pub mod transfers;
pub mod users;
