//! API request/response models for marketplace products.

use super::pagination::Pagination;
use crate::db::models::products::{ProductDBResponse, ProductUpdateDBRequest};
use crate::types::{CategoryId, ProductId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductCreate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<CategoryId>,
    pub name: String,
    /// URL-friendly identifier (must be unique)
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Listed minimum price; customers may pay more but never less
    pub min_price: Decimal,
    /// ISO 4217 currency code (defaults to the server's default currency)
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProductUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub min_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProductId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub min_price: Decimal,
    pub currency: String,
    pub is_active: bool,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing products
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListProductsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return products in this category
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<CategoryId>,

    /// Case-insensitive substring match against product name and description
    pub search: Option<String>,

    /// Include inactive products (admin only)
    pub include_inactive: Option<bool>,
}

impl From<ProductUpdate> for ProductUpdateDBRequest {
    fn from(api: ProductUpdate) -> Self {
        Self {
            category_id: api.category_id,
            name: api.name,
            description: api.description,
            image_url: api.image_url,
            min_price: api.min_price,
            is_active: api.is_active,
        }
    }
}

impl From<ProductDBResponse> for ProductResponse {
    fn from(db: ProductDBResponse) -> Self {
        Self {
            id: db.id,
            category_id: db.category_id,
            name: db.name,
            slug: db.slug,
            description: db.description,
            image_url: db.image_url,
            min_price: db.min_price,
            currency: db.currency,
            is_active: db.is_active,
            created_by: db.created_by,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
