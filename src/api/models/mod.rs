//! API request and response data models.
//!
//! Data structures used for HTTP request deserialization and response
//! serialization. These define the public API contract and are kept
//! distinct from database models so API and storage representations can
//! evolve independently. All models are annotated with `utoipa` for the
//! generated API docs.

pub mod auth;
pub mod categories;
pub mod exchange_rates;
pub mod orders;
pub mod pagination;
pub mod products;
pub mod services;
pub mod transfers;
pub mod users;
