//! Database record models matching table schemas.
//!
//! Struct definitions that correspond to database table rows. Repositories
//! use these to return query results and accept insertion/update data.
//! Database models are distinct from API models so storage and API
//! representations can evolve independently; conversions live on the API
//! side as `From` impls.

pub mod categories;
pub mod exchange_rates;
pub mod orders;
pub mod products;
pub mod services;
pub mod transfers;
pub mod users;
