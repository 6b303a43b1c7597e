//! Shared helpers for integration tests.

use axum::http::{HeaderName, HeaderValue};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    api::models::users::CurrentUser,
    auth::session,
    config::Config,
    db::{handlers::Users, models::users::UserCreateDBRequest},
    AppState,
};
use crate::db::handlers::Repository;

/// Config suitable for tests: native auth on, registration open, fixed secret.
pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_email: "admin@test.com".to_string(),
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    }
}

pub fn create_test_app_state(pool: PgPool, config: Config) -> AppState {
    AppState::builder().db(pool).config(config).build()
}

/// A user that exists only as a session claim, not in the database.
/// Use [`seed_user`] when the handler under test hits the users table.
pub fn test_current_user(is_admin: bool) -> CurrentUser {
    let id = Uuid::new_v4();
    CurrentUser {
        id,
        username: format!("user-{id}"),
        email: format!("user-{id}@example.com"),
        is_admin,
        display_name: None,
    }
}

/// Insert a user row and return it as a [`CurrentUser`] for minting sessions.
pub async fn seed_user(pool: &PgPool, username: &str, email: &str, is_admin: bool) -> CurrentUser {
    let mut conn = pool.acquire().await.expect("acquire connection");
    let mut users = Users::new(&mut conn);

    let created = users
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            email: email.to_string(),
            display_name: None,
            phone: None,
            is_admin,
            password_hash: None,
        })
        .await
        .expect("seed user");

    CurrentUser {
        id: created.id,
        username: created.username,
        email: created.email,
        is_admin: created.is_admin,
        display_name: created.display_name,
    }
}

/// Cookie header carrying a freshly minted session token for `user`.
pub fn session_header(user: &CurrentUser, config: &Config) -> (HeaderName, HeaderValue) {
    let token = session::create_session_token(user, config).expect("create session token");
    let cookie = format!("{}={token}", config.auth.native.session.cookie_name);

    (
        HeaderName::from_static("cookie"),
        HeaderValue::from_str(&cookie).expect("valid cookie header"),
    )
}
