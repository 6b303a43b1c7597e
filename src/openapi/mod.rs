//! OpenAPI documentation for the two API surfaces:
//! - [`ApiDoc`]: the versioned JSON API at `/api/v1/*`
//! - [`AuthApiDoc`]: the session endpoints at `/authentication/*`

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::api;

/// Registers the session-cookie security scheme referenced by the
/// `security(("session_token" = []))` annotations on protected handlers.
struct SessionSecurityAddon;

impl Modify for SessionSecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "session_token".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "remitd_session",
                    "JWT session cookie issued by POST /authentication/login. \
                     The same token is accepted as a Bearer token in the Authorization header.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Versioned JSON API")
    ),
    modifiers(&SessionSecurityAddon),
    paths(
        api::handlers::users::get_current_user,
        api::handlers::users::update_current_user,
        api::handlers::users::list_users,
        api::handlers::users::create_user,
        api::handlers::users::get_user,
        api::handlers::users::delete_user,
        api::handlers::categories::list_categories,
        api::handlers::categories::get_category,
        api::handlers::categories::create_category,
        api::handlers::categories::update_category,
        api::handlers::categories::delete_category,
        api::handlers::products::list_products,
        api::handlers::products::get_product,
        api::handlers::products::create_product,
        api::handlers::products::update_product,
        api::handlers::products::delete_product,
        api::handlers::services::list_services,
        api::handlers::services::get_service,
        api::handlers::services::create_service,
        api::handlers::services::update_service,
        api::handlers::services::delete_service,
        api::handlers::exchange_rates::list_rates,
        api::handlers::exchange_rates::get_rate,
        api::handlers::exchange_rates::put_rate,
        api::handlers::exchange_rates::delete_rate,
        api::handlers::transfers::quote,
        api::handlers::transfers::create_transfer,
        api::handlers::transfers::list_transfers,
        api::handlers::transfers::get_transfer,
        api::handlers::transfers::update_transfer,
        api::handlers::transfers::delete_transfer,
        api::handlers::orders::create_order,
        api::handlers::orders::list_orders,
        api::handlers::orders::get_order,
        api::handlers::orders::update_order,
        api::handlers::orders::delete_order,
    ),
    components(
        schemas(
            api::models::users::UserResponse,
            api::models::users::UserCreate,
            api::models::users::UserUpdate,
            api::models::users::CurrentUser,
            api::models::categories::CategoryResponse,
            api::models::categories::CategoryCreate,
            api::models::categories::CategoryUpdate,
            api::models::products::ProductResponse,
            api::models::products::ProductCreate,
            api::models::products::ProductUpdate,
            api::models::services::ServiceResponse,
            api::models::services::ServiceCreate,
            api::models::services::ServiceUpdate,
            api::models::exchange_rates::ExchangeRateResponse,
            api::models::exchange_rates::ExchangeRateUpsert,
            api::models::transfers::TransferStatus,
            api::models::transfers::QuoteRequest,
            api::models::transfers::QuoteResponse,
            api::models::transfers::TransferCreate,
            api::models::transfers::TransferUpdate,
            api::models::transfers::TransferResponse,
            api::models::orders::OrderStatus,
            api::models::orders::CartItem,
            api::models::orders::OrderCreate,
            api::models::orders::OrderUpdate,
            api::models::orders::OrderItemResponse,
            api::models::orders::OrderResponse,
        )
    ),
    tags(
        (name = "users", description = "Account management"),
        (name = "catalog", description = "Product categories and marketplace products"),
        (name = "services", description = "Offered services"),
        (name = "rates", description = "Exchange rates"),
        (name = "transfers", description = "Money transfers and quotes"),
        (name = "orders", description = "Checkout and orders"),
    )
)]
pub struct ApiDoc;

#[derive(OpenApi)]
#[openapi(
    modifiers(&SessionSecurityAddon),
    paths(
        api::handlers::auth::get_registration_info,
        api::handlers::auth::register,
        api::handlers::auth::get_login_info,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::change_password,
    ),
    components(
        schemas(
            api::models::auth::RegistrationInfo,
            api::models::auth::LoginInfo,
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::ChangePasswordRequest,
            api::models::auth::AuthResponse,
            api::models::auth::AuthSuccessResponse,
            api::models::users::UserResponse,
        )
    ),
    tags(
        (name = "authentication", description = "Registration, login, and session management"),
    )
)]
pub struct AuthApiDoc;
