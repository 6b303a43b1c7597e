use crate::{
    api::models::users::CurrentUser,
    auth::session,
    errors::{Error, Result},
    AppState,
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use tracing::{debug, instrument, trace};

/// Extract user from JWT session cookie if present and valid
/// Returns:
/// - None: No session cookie present
/// - Some(Ok(user)): Valid JWT found and verified
/// - Some(Err(error)): Cookie header present but malformed
#[instrument(skip(parts, config))]
fn try_jwt_session_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }))
        }
    };
    let cookie_name = &config.auth.native.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                // Try to verify the JWT session token
                match session::verify_session_token(value, config) {
                    Ok(user) => return Some(Ok(user)),
                    Err(_) => {
                        // Invalid/expired token, continue checking other cookies
                        // We don't propagate verification errors as they're expected for expired tokens
                        continue;
                    }
                }
            }
        }
    }
    None
}

/// Extract user from a Bearer token carrying the session JWT.
/// Returns:
/// - None: No Authorization header or not a Bearer token
/// - Some(Ok(user)): Valid session JWT
/// - Some(Err(error)): Bearer token present but invalid
#[instrument(skip(parts, config))]
fn try_bearer_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }))
        }
    };

    let token = auth_str.strip_prefix("Bearer ")?;

    Some(session::verify_session_token(token, config))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Try all authentication methods and return the first successful one.
        // Each method returns Option<Result<CurrentUser>>:
        // - None means the auth method is not applicable (no credentials present)
        // - Some(Ok(user)) means successful authentication
        // - Some(Err(error)) means auth credentials were present but invalid

        if !state.config.auth.native.enabled {
            return Err(Error::BadRequest {
                message: "Native authentication is disabled".to_string(),
            });
        }

        // Bearer token first (most specific)
        match try_bearer_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found bearer authenticated user: {}", user.id);
                return Ok(user);
            }
            Some(Err(e)) => {
                trace!("Bearer authentication failed: {:?}", e);
            }
            None => {
                trace!("No bearer authentication attempted");
            }
        }

        // Fall back to the session cookie
        match try_jwt_session_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found JWT session authenticated user: {}", user.id);
                return Ok(user);
            }
            Some(Err(e)) => {
                trace!("JWT session authentication failed: {:?}", e);
            }
            None => {
                trace!("No JWT session authentication attempted");
            }
        }

        Err(Error::Unauthenticated { message: None })
    }
}

/// Optional extraction for endpoints that are public but behave differently
/// for authenticated users. Missing credentials yield `None`; malformed
/// credentials still fail the request.
impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>> {
        match <CurrentUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(Error::Unauthenticated { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::create_session_token;
    use crate::test_utils::{create_test_config, test_current_user};
    use sqlx::PgPool;

    fn parts_with_header(header_name: &str, header_value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(header_name, header_value)
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_cookie_session_extraction(pool: PgPool) {
        let config = create_test_config();
        let user = test_current_user(false);
        let token = create_session_token(&user, &config).unwrap();
        let cookie_name = config.auth.native.session.cookie_name.clone();

        let state = crate::test_utils::create_test_app_state(pool, config);

        let mut parts = parts_with_header("cookie", &format!("{cookie_name}={token}"));
        let extracted = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(extracted.id, user.id);
        assert_eq!(extracted.email, user.email);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_bearer_session_extraction(pool: PgPool) {
        let config = create_test_config();
        let user = test_current_user(true);
        let token = create_session_token(&user, &config).unwrap();

        let state = crate::test_utils::create_test_app_state(pool, config);

        let mut parts = parts_with_header("authorization", &format!("Bearer {token}"));
        let extracted = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(extracted.id, user.id);
        assert!(extracted.is_admin);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_missing_credentials_returns_unauthorized(pool: PgPool) {
        let state = crate::test_utils::create_test_app_state(pool, create_test_config());

        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let result = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state).await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
