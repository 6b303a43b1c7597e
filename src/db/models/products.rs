//! Database models for marketplace products.

use crate::types::{CategoryId, ProductId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct ProductCreateDBRequest {
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub min_price: Decimal,
    pub currency: String,
    pub created_by: Option<UserId>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductUpdateDBRequest {
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub min_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductDBResponse {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub min_price: Decimal,
    pub currency: String,
    pub is_active: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
