//! Database repository for exchange rates.
//!
//! Rates are keyed by (base, quote) currency pair rather than by id, so this
//! repository exposes pair-oriented operations instead of the generic
//! [`Repository`](super::repository::Repository) trait.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::Result,
    models::exchange_rates::{ExchangeRateDBResponse, ExchangeRateUpsertDBRequest},
};

pub struct ExchangeRates<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ExchangeRates<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert or replace the rate for a currency pair.
    #[instrument(skip(self, request), fields(pair = %format!("{}/{}", request.base_currency, request.quote_currency)), err)]
    pub async fn upsert(&mut self, request: &ExchangeRateUpsertDBRequest) -> Result<ExchangeRateDBResponse> {
        let rate = sqlx::query_as::<_, ExchangeRateDBResponse>(
            r#"
            INSERT INTO exchange_rates (id, base_currency, quote_currency, rate)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT ON CONSTRAINT exchange_rates_pair_unique
            DO UPDATE SET rate = EXCLUDED.rate, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.base_currency)
        .bind(&request.quote_currency)
        .bind(request.rate)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(rate)
    }

    #[instrument(skip(self), err)]
    pub async fn get_pair(&mut self, base: &str, quote: &str) -> Result<Option<ExchangeRateDBResponse>> {
        let rate = sqlx::query_as::<_, ExchangeRateDBResponse>(
            "SELECT * FROM exchange_rates WHERE base_currency = $1 AND quote_currency = $2",
        )
        .bind(base)
        .bind(quote)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(rate)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<ExchangeRateDBResponse>> {
        let rates = sqlx::query_as::<_, ExchangeRateDBResponse>(
            "SELECT * FROM exchange_rates ORDER BY base_currency ASC, quote_currency ASC",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rates)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_pair(&mut self, base: &str, quote: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM exchange_rates WHERE base_currency = $1 AND quote_currency = $2")
            .bind(base)
            .bind(quote)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
