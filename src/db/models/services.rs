//! Database models for the service directory.

use crate::types::ServiceId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ServiceCreateDBRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceDBResponse {
    pub id: ServiceId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
