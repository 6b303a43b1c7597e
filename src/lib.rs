//! remitd: money-transfer and marketplace backend.
//!
//! The service exposes a JSON API over PostgreSQL covering:
//! - Accounts and session authentication (`/authentication/*`, `/api/v1/users`)
//! - The product catalog and offered services (`/api/v1/{categories,products,services}`)
//! - Exchange rates and transfer pricing (`/api/v1/rates`, `/api/v1/transfers`)
//! - Checkout with server-side pricing and idempotent order creation (`/api/v1/orders`)
//!
//! [`Application`] wires the pieces together: load a [`config::Config`], connect
//! to Postgres, run migrations, and serve the router from [`build_router`].

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use bon::Builder;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub mod api;
pub mod auth;
pub mod cart;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod quote;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    auth::password,
    config::{Config, CorsOrigin},
    db::{handlers::Users, models::users::UserCreateDBRequest},
};

pub use types::{CategoryId, ExchangeRateId, OrderId, OrderItemId, ProductId, ServiceId, TransferId, UserId};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the remitd database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: creates the admin on first startup, and updates the password on
/// later startups when one is configured. Returns the admin's user id.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(
    email: &str,
    password: Option<&str>,
    params: password::Argon2Params,
    db: &PgPool,
) -> errors::Result<UserId> {
    let password_hash = password.map(|p| password::hash_string(p, params)).transpose()?;

    let mut tx = db.begin().await.map_err(|e| errors::Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing) = user_repo.get_user_by_email(email).await? {
        if let Some(password_hash) = password_hash {
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE email = $2")
                .bind(password_hash)
                .bind(email)
                .execute(&mut *tx)
                .await
                .map_err(db::errors::DbError::from)?;
        }
        tx.commit().await.map_err(|e| errors::Error::Database(e.into()))?;
        return Ok(existing.id);
    }

    use db::handlers::Repository;
    let created = user_repo
        .create(&UserCreateDBRequest {
            username: email.to_string(),
            email: email.to_string(),
            display_name: None,
            phone: None,
            is_admin: true,
            password_hash,
        })
        .await?;

    tx.commit().await.map_err(|e| errors::Error::Database(e.into()))?;
    Ok(created.id)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![axum::http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// Authentication routes live at the root so they can be masked when the
/// service sits behind an SSO proxy; everything else is versioned under
/// `/api/v1`. API docs are served at `/docs`.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers;
    use axum::routing::{delete, patch, put};

    let auth_routes = Router::new()
        .route(
            "/authentication/register",
            get(handlers::auth::get_registration_info).post(handlers::auth::register),
        )
        .route("/authentication/login", get(handlers::auth::get_login_info).post(handlers::auth::login))
        .route("/authentication/logout", post(handlers::auth::logout))
        .route("/authentication/password-change", post(handlers::auth::change_password))
        .with_state(state.clone());

    let api_routes = Router::new()
        // Account management
        .route("/users/me", get(handlers::users::get_current_user).patch(handlers::users::update_current_user))
        .route("/users", get(handlers::users::list_users))
        .route("/users", post(handlers::users::create_user))
        .route("/users/{id}", get(handlers::users::get_user))
        .route("/users/{id}", delete(handlers::users::delete_user))
        // Catalog
        .route("/categories", get(handlers::categories::list_categories))
        .route("/categories", post(handlers::categories::create_category))
        .route("/categories/{id}", get(handlers::categories::get_category))
        .route("/categories/{id}", patch(handlers::categories::update_category))
        .route("/categories/{id}", delete(handlers::categories::delete_category))
        .route("/products", get(handlers::products::list_products))
        .route("/products", post(handlers::products::create_product))
        .route("/products/{id}", get(handlers::products::get_product))
        .route("/products/{id}", patch(handlers::products::update_product))
        .route("/products/{id}", delete(handlers::products::delete_product))
        .route("/services", get(handlers::services::list_services))
        .route("/services", post(handlers::services::create_service))
        .route("/services/{id}", get(handlers::services::get_service))
        .route("/services/{id}", patch(handlers::services::update_service))
        .route("/services/{id}", delete(handlers::services::delete_service))
        // Exchange rates
        .route("/rates", get(handlers::exchange_rates::list_rates))
        .route("/rates/{base}/{quote}", get(handlers::exchange_rates::get_rate))
        .route("/rates/{base}/{quote}", put(handlers::exchange_rates::put_rate))
        .route("/rates/{base}/{quote}", delete(handlers::exchange_rates::delete_rate))
        // Transfers
        .route("/transfers/quote", post(handlers::transfers::quote))
        .route("/transfers", get(handlers::transfers::list_transfers))
        .route("/transfers", post(handlers::transfers::create_transfer))
        .route("/transfers/{id}", get(handlers::transfers::get_transfer))
        .route("/transfers/{id}", patch(handlers::transfers::update_transfer))
        .route("/transfers/{id}", delete(handlers::transfers::delete_transfer))
        // Checkout
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders/{id}", get(handlers::orders::get_order))
        .route("/orders/{id}", patch(handlers::orders::update_order))
        .route("/orders/{id}", delete(handlers::orders::delete_order))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", openapi::ApiDoc::openapi()))
        .merge(Scalar::with_url("/docs/authentication", openapi::AuthApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// A fully initialized service: pool connected, migrations applied, router built.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await?;

        migrator().run(&pool).await?;

        create_initial_admin_user(
            &config.admin_email,
            config.admin_password.as_deref(),
            password::Argon2Params::from(&config.auth.native.password),
            &pool,
        )
        .await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("remitd listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::handlers::Repository;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_initial_admin_user_is_idempotent(pool: PgPool) {
        let params = password::Argon2Params::default();
        let first = create_initial_admin_user("admin@example.com", Some("initial-password"), params, &pool)
            .await
            .unwrap();
        let second = create_initial_admin_user("admin@example.com", Some("rotated-password"), params, &pool)
            .await
            .unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);
        let admin = users.get_by_id(first).await.unwrap().unwrap();
        assert!(admin.is_admin);

        // Rotated password is the one that verifies
        let hash = admin.password_hash.unwrap();
        assert!(password::verify_string("rotated-password", &hash).unwrap());
        assert!(!password::verify_string("initial-password", &hash).unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_router_serves_health_and_docs(pool: PgPool) {
        let state = crate::test_utils::create_test_app_state(pool, crate::test_utils::create_test_config());
        let server = axum_test::TestServer::new(build_router(state).unwrap()).unwrap();

        server.get("/healthz").await.assert_status_ok();
        server.get("/docs").await.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_end_to_end_register_quote_and_transfer(pool: PgPool) {
        use serde_json::json;

        let config = crate::test_utils::create_test_config();
        let admin = crate::test_utils::seed_user(&pool, "admin", "admin@example.com", true).await;
        let state = crate::test_utils::create_test_app_state(pool, config.clone());
        let server = axum_test::TestServer::new(build_router(state).unwrap()).unwrap();

        // Admin stores a rate
        let (name, value) = crate::test_utils::session_header(&admin, &config);
        server
            .put("/api/v1/rates/USD/GHS")
            .add_header(name, value)
            .json(&json!({"rate": "15.80"}))
            .await
            .assert_status_ok();

        // A new user registers and is logged in by the returned cookie
        let response = server
            .post("/authentication/register")
            .json(&json!({
                "username": "ama",
                "email": "ama@example.com",
                "password": "correct-horse-battery",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
        let session_cookie = cookie.split(';').next().unwrap().to_string();

        // Public quote
        let quote: serde_json::Value = server
            .post("/api/v1/transfers/quote")
            .json(&json!({"send_amount": "200", "source_currency": "USD", "destination_currency": "GHS"}))
            .await
            .json();
        assert_eq!(quote["received_amount"], "3160.00");

        // Authenticated transfer creation via the session cookie
        let response = server
            .post("/api/v1/transfers")
            .add_header(
                axum::http::HeaderName::from_static("cookie"),
                axum::http::HeaderValue::from_str(&session_cookie).unwrap(),
            )
            .json(&json!({
                "recipient_name": "Kwame Mensah",
                "recipient_country": "Ghana",
                "source_currency": "USD",
                "destination_currency": "GHS",
                "send_amount": "200",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
    }
}
