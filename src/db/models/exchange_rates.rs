//! Database models for exchange rates.

use crate::types::ExchangeRateId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Upsert request: one row per (base, quote) pair.
#[derive(Debug, Clone)]
pub struct ExchangeRateUpsertDBRequest {
    pub base_currency: String,
    pub quote_currency: String,
    pub rate: Decimal,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExchangeRateDBResponse {
    pub id: ExchangeRateId,
    pub base_currency: String,
    pub quote_currency: String,
    pub rate: Decimal,
    pub updated_at: DateTime<Utc>,
}
