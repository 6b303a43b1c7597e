//! API request/response models for orders and checkout.

use super::pagination::Pagination;
use crate::db::models::orders::{OrderDBResponse, OrderItemDBResponse, OrderUpdateDBRequest};
use crate::types::{OrderId, OrderItemId, ProductId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Lifecycle of an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Completed,
    Cancelled,
}

/// One line of a checkout request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    #[schema(value_type = String, format = "uuid")]
    pub product_id: ProductId,
    pub quantity: i32,
    /// Optional pay-what-you-want price; must be at or above the product's
    /// listed minimum. Omitted means the minimum applies.
    pub unit_price: Option<Decimal>,
}

/// Checkout request. Line prices and the total are recomputed server-side;
/// nothing monetary in this payload is trusted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderCreate {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    /// Opaque token from the payment processor; never a card number
    pub payment_reference: Option<String>,
    /// Client-generated key making the checkout retry-safe. Resubmitting
    /// with the same key returns the original order.
    pub idempotency_key: String,
    pub items: Vec<CartItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub shipping_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: OrderItemId,
    #[schema(value_type = String, format = "uuid")]
    pub product_id: ProductId,
    /// Product name at the time of purchase
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: OrderId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub idempotency_key: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing orders
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListOrdersQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return orders with this status
    pub status: Option<OrderStatus>,
}

impl From<OrderUpdate> for OrderUpdateDBRequest {
    fn from(api: OrderUpdate) -> Self {
        Self {
            status: api.status,
            shipping_address: api.shipping_address,
        }
    }
}

impl From<OrderItemDBResponse> for OrderItemResponse {
    fn from(db: OrderItemDBResponse) -> Self {
        Self {
            id: db.id,
            product_id: db.product_id,
            product_name: db.product_name,
            unit_price: db.unit_price,
            quantity: db.quantity,
            line_total: db.line_total,
        }
    }
}

impl From<OrderDBResponse> for OrderResponse {
    fn from(db: OrderDBResponse) -> Self {
        Self {
            id: db.order.id,
            user_id: db.order.user_id,
            customer_name: db.order.customer_name,
            customer_email: db.order.customer_email,
            customer_phone: db.order.customer_phone,
            shipping_address: db.order.shipping_address,
            idempotency_key: db.order.idempotency_key,
            total_amount: db.order.total_amount,
            currency: db.order.currency,
            status: db.order.status,
            items: db.items.into_iter().map(OrderItemResponse::from).collect(),
            created_at: db.order.created_at,
            updated_at: db.order.updated_at,
        }
    }
}
