//! API request/response models for money transfers.

use super::pagination::Pagination;
use crate::db::models::transfers::TransferDBResponse;
use crate::quote::TransferQuote;
use crate::types::{TransferId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Lifecycle of a transfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "transfer_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

/// Request for a cost estimate. Nothing is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuoteRequest {
    /// Amount to send, in the source currency
    pub send_amount: Decimal,
    /// ISO 4217 code of the currency the sender pays in
    pub source_currency: String,
    /// ISO 4217 code of the currency the recipient receives
    pub destination_currency: String,
}

/// A computed cost estimate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuoteResponse {
    pub source_currency: String,
    pub destination_currency: String,
    pub send_amount: Decimal,
    /// Fee charged on top of the send amount, in the source currency
    pub fee_amount: Decimal,
    /// Total the sender pays: send_amount + fee_amount
    pub total_charge: Decimal,
    /// The conversion rate applied
    pub rate: Decimal,
    /// Amount the recipient receives: send_amount * rate
    pub received_amount: Decimal,
}

impl QuoteResponse {
    pub fn from_quote(quote: TransferQuote, source_currency: String, destination_currency: String) -> Self {
        Self {
            source_currency,
            destination_currency,
            send_amount: quote.send_amount,
            fee_amount: quote.fee_amount,
            total_charge: quote.total_charge,
            rate: quote.rate,
            received_amount: quote.received_amount,
        }
    }
}

/// Request to create a transfer. Amounts beyond `send_amount` are computed
/// server-side from the stored rate and fee schedule.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferCreate {
    pub recipient_name: String,
    /// ISO 3166 country code of the recipient
    pub recipient_country: String,
    pub source_currency: String,
    pub destination_currency: String,
    pub send_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferUpdate {
    pub status: Option<TransferStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TransferId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub recipient_name: String,
    pub recipient_country: String,
    pub source_currency: String,
    pub destination_currency: String,
    pub send_amount: Decimal,
    pub fee_amount: Decimal,
    pub total_charge: Decimal,
    pub rate: Decimal,
    pub received_amount: Decimal,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing transfers
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListTransfersQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return transfers with this status
    pub status: Option<TransferStatus>,
}

impl From<TransferDBResponse> for TransferResponse {
    fn from(db: TransferDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            recipient_name: db.recipient_name,
            recipient_country: db.recipient_country,
            source_currency: db.source_currency,
            destination_currency: db.destination_currency,
            send_amount: db.send_amount,
            fee_amount: db.fee_amount,
            total_charge: db.send_amount + db.fee_amount,
            rate: db.rate,
            received_amount: db.received_amount,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
