//! API request/response models for product categories.

use super::pagination::Pagination;
use crate::db::models::categories::{CategoryCreateDBRequest, CategoryDBResponse, CategoryUpdateDBRequest};
use crate::types::CategoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryCreate {
    pub name: String,
    /// URL-friendly identifier (must be unique)
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListCategoriesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

impl From<CategoryCreate> for CategoryCreateDBRequest {
    fn from(api: CategoryCreate) -> Self {
        Self {
            name: api.name,
            slug: api.slug,
            description: api.description,
        }
    }
}

impl From<CategoryUpdate> for CategoryUpdateDBRequest {
    fn from(api: CategoryUpdate) -> Self {
        Self {
            name: api.name,
            description: api.description,
        }
    }
}

impl From<CategoryDBResponse> for CategoryResponse {
    fn from(db: CategoryDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            description: db.description,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
