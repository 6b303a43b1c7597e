//! Database models for money transfers.

use crate::api::models::transfers::TransferStatus;
use crate::types::{TransferId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Database request for recording a transfer. All amounts are computed
/// server-side from the stored rate and fee schedule before this is built.
#[derive(Debug, Clone)]
pub struct TransferCreateDBRequest {
    pub user_id: UserId,
    pub recipient_name: String,
    pub recipient_country: String,
    pub source_currency: String,
    pub destination_currency: String,
    pub send_amount: Decimal,
    pub fee_amount: Decimal,
    pub rate: Decimal,
    pub received_amount: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct TransferUpdateDBRequest {
    pub status: Option<TransferStatus>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransferDBResponse {
    pub id: TransferId,
    pub user_id: UserId,
    pub recipient_name: String,
    pub recipient_country: String,
    pub source_currency: String,
    pub destination_currency: String,
    pub send_amount: Decimal,
    pub fee_amount: Decimal,
    pub rate: Decimal,
    pub received_amount: Decimal,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
