//! Database layer for data persistence and access.
//!
//! Implements the data access layer using SQLx with PostgreSQL, following
//! the Repository pattern: API handlers call repositories
//! ([`handlers`]), which read and write record structs ([`models`]) that
//! match the table schemas.
//!
//! Migrations live in the `migrations/` directory and are exposed through
//! [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
