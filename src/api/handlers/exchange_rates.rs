use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;

use crate::{
    api::models::{
        exchange_rates::{ExchangeRateResponse, ExchangeRateUpsert},
        users::CurrentUser,
    },
    auth::permissions::require_admin,
    db::{handlers::ExchangeRates, models::exchange_rates::ExchangeRateUpsertDBRequest},
    errors::{Error, Result},
    types::{Operation, Resource},
    AppState,
};

fn normalize_currency(code: &str) -> Result<String> {
    let code = code.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::BadRequest {
            message: format!("'{code}' is not a valid ISO 4217 currency code"),
        });
    }
    Ok(code)
}

/// List all stored exchange rates (public)
#[utoipa::path(
    get,
    path = "/rates",
    tag = "rates",
    responses(
        (status = 200, description = "All stored rates", body = Vec<ExchangeRateResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_rates(State(state): State<AppState>) -> Result<Json<Vec<ExchangeRateResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ExchangeRates::new(&mut conn);

    let rates = repo.list().await?;
    Ok(Json(rates.into_iter().map(ExchangeRateResponse::from).collect()))
}

/// Get the rate for a currency pair (public)
#[utoipa::path(
    get,
    path = "/rates/{base}/{quote}",
    tag = "rates",
    params(
        ("base" = String, Path, description = "ISO 4217 code of the currency being sold"),
        ("quote" = String, Path, description = "ISO 4217 code of the currency being bought"),
    ),
    responses(
        (status = 200, description = "Rate for the pair", body = ExchangeRateResponse),
        (status = 404, description = "No rate stored for this pair"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_rate(State(state): State<AppState>, Path((base, quote)): Path<(String, String)>) -> Result<Json<ExchangeRateResponse>> {
    let base = normalize_currency(&base)?;
    let quote = normalize_currency(&quote)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ExchangeRates::new(&mut conn);

    let rate = repo.get_pair(&base, &quote).await?.ok_or_else(|| Error::NotFound {
        resource: "exchange rate".to_string(),
        id: format!("{base}/{quote}"),
    })?;

    Ok(Json(ExchangeRateResponse::from(rate)))
}

/// Set the rate for a currency pair (admin only). Creates or replaces.
#[utoipa::path(
    put,
    path = "/rates/{base}/{quote}",
    request_body = ExchangeRateUpsert,
    tag = "rates",
    params(
        ("base" = String, Path, description = "ISO 4217 code of the currency being sold"),
        ("quote" = String, Path, description = "ISO 4217 code of the currency being bought"),
    ),
    responses(
        (status = 200, description = "Rate stored", body = ExchangeRateResponse),
        (status = 400, description = "Invalid pair or rate"),
        (status = 403, description = "Forbidden"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn put_rate(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((base, quote)): Path<(String, String)>,
    Json(request): Json<ExchangeRateUpsert>,
) -> Result<Json<ExchangeRateResponse>> {
    require_admin(&current_user, Resource::ExchangeRates, Operation::UpdateAll)?;

    let base = normalize_currency(&base)?;
    let quote = normalize_currency(&quote)?;
    if base == quote {
        return Err(Error::BadRequest {
            message: "Base and quote currency must differ".to_string(),
        });
    }
    if request.rate <= Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "Rate must be positive".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ExchangeRates::new(&mut conn);

    let rate = repo
        .upsert(&ExchangeRateUpsertDBRequest {
            base_currency: base,
            quote_currency: quote,
            rate: request.rate,
        })
        .await?;

    Ok(Json(ExchangeRateResponse::from(rate)))
}

/// Remove the rate for a currency pair (admin only)
#[utoipa::path(
    delete,
    path = "/rates/{base}/{quote}",
    tag = "rates",
    params(
        ("base" = String, Path, description = "ISO 4217 code of the currency being sold"),
        ("quote" = String, Path, description = "ISO 4217 code of the currency being bought"),
    ),
    responses(
        (status = 204, description = "Rate removed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No rate stored for this pair"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_rate(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((base, quote)): Path<(String, String)>,
) -> Result<StatusCode> {
    require_admin(&current_user, Resource::ExchangeRates, Operation::DeleteAll)?;

    let base = normalize_currency(&base)?;
    let quote = normalize_currency(&quote)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ExchangeRates::new(&mut conn);

    if repo.delete_pair(&base, &quote).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "exchange rate".to_string(),
            id: format!("{base}/{quote}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app_state, create_test_config, seed_user, session_header};
    use axum::routing::get;
    use axum::Router;
    use axum_test::TestServer;
    use serde_json::json;
    use sqlx::PgPool;

    fn rates_router(state: AppState) -> Router {
        Router::new()
            .route("/rates", get(list_rates))
            .route("/rates/{base}/{quote}", get(get_rate).put(put_rate).delete(delete_rate))
            .with_state(state)
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_put_rate_requires_admin_and_is_readable_publicly(pool: PgPool) {
        let config = create_test_config();
        let user = seed_user(&pool, "plain", "plain@example.com", false).await;
        let admin = seed_user(&pool, "admin", "admin@example.com", true).await;

        let server = TestServer::new(rates_router(create_test_app_state(pool, config.clone()))).unwrap();

        let (name, value) = session_header(&user, &config);
        server
            .put("/rates/USD/EUR")
            .add_header(name, value)
            .json(&json!({"rate": "0.92"}))
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);

        let (name, value) = session_header(&admin, &config);
        server
            .put("/rates/USD/EUR")
            .add_header(name, value)
            .json(&json!({"rate": "0.92"}))
            .await
            .assert_status_ok();

        let fetched: ExchangeRateResponse = server.get("/rates/USD/EUR").await.json();
        assert_eq!(fetched.rate, rust_decimal_macros::dec!(0.92));

        // Pair is normalized to uppercase
        let fetched: ExchangeRateResponse = server.get("/rates/usd/eur").await.json();
        assert_eq!(fetched.base_currency, "USD");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_pair_or_rate_rejected(pool: PgPool) {
        let config = create_test_config();
        let admin = seed_user(&pool, "admin", "admin@example.com", true).await;

        let server = TestServer::new(rates_router(create_test_app_state(pool, config.clone()))).unwrap();
        let (name, value) = session_header(&admin, &config);

        server
            .put("/rates/USD/USD")
            .add_header(name.clone(), value.clone())
            .json(&json!({"rate": "1.0"}))
            .await
            .assert_status(axum::http::StatusCode::BAD_REQUEST);

        server
            .put("/rates/US1/EUR")
            .add_header(name.clone(), value.clone())
            .json(&json!({"rate": "1.0"}))
            .await
            .assert_status(axum::http::StatusCode::BAD_REQUEST);

        server
            .put("/rates/USD/EUR")
            .add_header(name, value)
            .json(&json!({"rate": "0"}))
            .await
            .assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_pair_is_not_found(pool: PgPool) {
        let server = TestServer::new(rates_router(create_test_app_state(pool, create_test_config()))).unwrap();
        server.get("/rates/USD/JPY").await.assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}
