//! API request/response models for the service directory.

use super::pagination::Pagination;
use crate::db::models::services::{ServiceCreateDBRequest, ServiceDBResponse, ServiceUpdateDBRequest};
use crate::types::ServiceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceCreate {
    pub name: String,
    /// URL-friendly identifier (must be unique)
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ServiceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ServiceId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListServicesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Include inactive services (admin only)
    pub include_inactive: Option<bool>,
}

impl From<ServiceCreate> for ServiceCreateDBRequest {
    fn from(api: ServiceCreate) -> Self {
        Self {
            name: api.name,
            slug: api.slug,
            description: api.description,
        }
    }
}

impl From<ServiceUpdate> for ServiceUpdateDBRequest {
    fn from(api: ServiceUpdate) -> Self {
        Self {
            name: api.name,
            description: api.description,
            is_active: api.is_active,
        }
    }
}

impl From<ServiceDBResponse> for ServiceResponse {
    fn from(db: ServiceDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            description: db.description,
            is_active: db.is_active,
            created_at: db.created_at,
        }
    }
}
