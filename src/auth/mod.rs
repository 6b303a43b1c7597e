//! Authentication and authorization.
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`session`]: JWT session token creation and verification
//! - [`current_user`]: axum extractor that resolves the authenticated user
//! - [`permissions`]: admin/own-resource permission checks

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
