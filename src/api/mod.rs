//! HTTP API surface: request/response models and their handlers.

pub mod handlers;
pub mod models;
