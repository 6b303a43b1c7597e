//! API request/response models for exchange rates.

use crate::db::models::exchange_rates::ExchangeRateDBResponse;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request to set the rate for a currency pair. The pair itself comes from
/// the URL path.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExchangeRateUpsert {
    /// Units of quote currency per unit of base currency (must be positive)
    pub rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExchangeRateResponse {
    /// ISO 4217 code of the currency being sold
    pub base_currency: String,
    /// ISO 4217 code of the currency being bought
    pub quote_currency: String,
    pub rate: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<ExchangeRateDBResponse> for ExchangeRateResponse {
    fn from(db: ExchangeRateDBResponse) -> Self {
        Self {
            base_currency: db.base_currency,
            quote_currency: db.quote_currency,
            rate: db.rate,
            updated_at: db.updated_at,
        }
    }
}
