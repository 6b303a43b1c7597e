//! Database models for orders and order items.

use crate::api::models::orders::OrderStatus;
use crate::types::{OrderId, OrderItemId, ProductId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// A single priced line to insert alongside the order.
#[derive(Debug, Clone)]
pub struct OrderItemDBRequest {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// Database request for creating an order with its items in one transaction.
///
/// `total_amount` is recomputed server-side from the items before this is
/// built, never taken from the client.
#[derive(Debug, Clone)]
pub struct OrderCreateDBRequest {
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub payment_reference: Option<String>,
    pub idempotency_key: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub items: Vec<OrderItemDBRequest>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderUpdateDBRequest {
    pub status: Option<OrderStatus>,
    pub shipping_address: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub payment_reference: Option<String>,
    pub idempotency_key: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemDBResponse {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// An order with its items attached.
#[derive(Debug, Clone)]
pub struct OrderDBResponse {
    pub order: OrderRow,
    pub items: Vec<OrderItemDBResponse>,
}
