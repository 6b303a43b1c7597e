use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        orders::{ListOrdersQuery, OrderCreate, OrderResponse, OrderUpdate},
        pagination::PaginatedResponse,
        users::CurrentUser,
    },
    auth::permissions::require_admin,
    cart::{order_total, price_line, CartError},
    db::{
        handlers::{orders::OrderFilter, Orders, Products, Repository},
        models::orders::{OrderCreateDBRequest, OrderItemDBRequest},
    },
    errors::{Error, Result},
    types::{Operation, OrderId, Resource},
    AppState,
};

impl From<CartError> for Error {
    fn from(err: CartError) -> Self {
        Error::BadRequest { message: err.to_string() }
    }
}

/// Place an order. Guest checkout is allowed; an authenticated session
/// attaches the order to the user.
///
/// Every line is re-priced server-side against the product's listed minimum
/// and the total is recomputed from the re-priced lines. Resubmitting with
/// the same idempotency key returns the original order unchanged.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = OrderCreate,
    tag = "orders",
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 200, description = "Order already placed with this idempotency key", body = OrderResponse),
        (status = 400, description = "Invalid cart"),
        (status = 404, description = "Unknown product"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_order(
    State(state): State<AppState>,
    current_user: Option<CurrentUser>,
    Json(request): Json<OrderCreate>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    if request.idempotency_key.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Idempotency key is required".to_string(),
        });
    }
    if request.items.is_empty() {
        return Err(Error::BadRequest {
            message: "Order must contain at least one item".to_string(),
        });
    }
    if request.customer_name.trim().is_empty() || request.customer_email.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Customer name and email are required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    // Replay: same key returns the original order without touching the cart
    let mut repo = Orders::new(&mut conn);
    if let Some(existing) = repo.get_by_idempotency_key(&request.idempotency_key).await? {
        return Ok((StatusCode::OK, Json(OrderResponse::from(existing))));
    }

    // Re-price every line from the product records
    let product_ids = request.items.iter().map(|i| i.product_id).collect();
    let mut products_repo = Products::new(&mut conn);
    let products = products_repo.get_bulk(product_ids).await?;

    let mut items = Vec::with_capacity(request.items.len());
    let mut priced_lines = Vec::with_capacity(request.items.len());
    let mut currency: Option<String> = None;

    for item in &request.items {
        let product = products.get(&item.product_id).ok_or_else(|| Error::NotFound {
            resource: "product".to_string(),
            id: item.product_id.to_string(),
        })?;

        if !product.is_active {
            return Err(Error::BadRequest {
                message: format!("Product '{}' is no longer available", product.name),
            });
        }

        match &currency {
            None => currency = Some(product.currency.clone()),
            Some(c) if *c != product.currency => {
                return Err(Error::BadRequest {
                    message: "All products in an order must share a currency".to_string(),
                })
            }
            Some(_) => {}
        }

        let line = price_line(product.id, product.min_price, item.unit_price, item.quantity)?;

        items.push(OrderItemDBRequest {
            product_id: line.product_id,
            product_name: product.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            line_total: line.line_total,
        });
        priced_lines.push(line);
    }

    let create_request = OrderCreateDBRequest {
        user_id: current_user.map(|u| u.id),
        customer_name: request.customer_name,
        customer_email: request.customer_email,
        customer_phone: request.customer_phone,
        shipping_address: request.shipping_address,
        payment_reference: request.payment_reference,
        idempotency_key: request.idempotency_key.clone(),
        total_amount: order_total(&priced_lines),
        currency: currency.unwrap_or_else(|| state.config.default_currency.clone()),
        items,
    };

    let mut repo = Orders::new(&mut conn);
    match repo.create(&create_request).await {
        Ok(order) => Ok((StatusCode::CREATED, Json(OrderResponse::from(order)))),
        // Lost a race with a concurrent submission of the same key: return
        // the order that won
        Err(err) if err.is_unique_violation_on("orders_idempotency_key_unique") => {
            let existing = repo
                .get_by_idempotency_key(&request.idempotency_key)
                .await?
                .ok_or_else(|| Error::Internal {
                    operation: "fetch order after idempotency conflict".to_string(),
                })?;
            Ok((StatusCode::OK, Json(OrderResponse::from(existing))))
        }
        Err(err) => Err(err.into()),
    }
}

/// List orders. Admins see everyone's; everyone else sees their own.
#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "List of orders", body = PaginatedResponse<OrderResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<PaginatedResponse<OrderResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut filter = OrderFilter::new(skip, limit);
    if !current_user.is_admin {
        filter = filter.for_user(current_user.id);
    }
    if let Some(status) = query.status {
        filter = filter.with_status(status);
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Orders::new(&mut conn);

    let orders = repo.list(&filter).await?;
    let data = orders.into_iter().map(OrderResponse::from).collect();

    Ok(Json(PaginatedResponse::new(data, skip, limit)))
}

/// Get an order. Owners and admins only.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    params(("id" = String, Path, format = "uuid", description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Orders::new(&mut conn);

    let order = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "order".to_string(),
        id: id.to_string(),
    })?;

    // Hide other users' orders rather than confirming they exist
    if order.order.user_id != Some(current_user.id) && !current_user.is_admin {
        return Err(Error::NotFound {
            resource: "order".to_string(),
            id: id.to_string(),
        });
    }

    Ok(Json(OrderResponse::from(order)))
}

/// Update an order's status or shipping address (admin only)
#[utoipa::path(
    patch,
    path = "/orders/{id}",
    request_body = OrderUpdate,
    tag = "orders",
    params(("id" = String, Path, format = "uuid", description = "Order id")),
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<OrderId>,
    Json(request): Json<OrderUpdate>,
) -> Result<Json<OrderResponse>> {
    require_admin(&current_user, Resource::Orders, Operation::UpdateAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Orders::new(&mut conn);

    let order = repo.update(id, &request.into()).await?;
    Ok(Json(OrderResponse::from(order)))
}

/// Delete an order (admin only)
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    tag = "orders",
    params(("id" = String, Path, format = "uuid", description = "Order id")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_order(State(state): State<AppState>, current_user: CurrentUser, Path(id): Path<OrderId>) -> Result<StatusCode> {
    require_admin(&current_user, Resource::Orders, Operation::DeleteAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Orders::new(&mut conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "order".to_string(),
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::products::ProductCreateDBRequest;
    use crate::test_utils::{create_test_app_state, create_test_config, seed_user, session_header};
    use crate::types::ProductId;
    use axum::routing::get;
    use axum::Router;
    use axum_test::TestServer;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use sqlx::PgPool;

    fn orders_router(state: AppState) -> Router {
        Router::new()
            .route("/orders", get(list_orders).post(create_order))
            .route("/orders/{id}", get(get_order).patch(update_order).delete(delete_order))
            .with_state(state)
    }

    async fn seed_product(pool: &PgPool, slug: &str, min_price: rust_decimal::Decimal) -> ProductId {
        let mut conn = pool.acquire().await.unwrap();
        Products::new(&mut conn)
            .create(&ProductCreateDBRequest {
                category_id: None,
                name: format!("Product {slug}"),
                slug: slug.to_string(),
                description: None,
                image_url: None,
                min_price,
                currency: "USD".to_string(),
                created_by: None,
            })
            .await
            .unwrap()
            .id
    }

    fn checkout_body(product_id: ProductId, key: &str, unit_price: Option<&str>) -> serde_json::Value {
        json!({
            "customer_name": "Kofi Annor",
            "customer_email": "kofi@example.com",
            "shipping_address": "12 High St, Accra",
            "idempotency_key": key,
            "items": [{
                "product_id": product_id,
                "quantity": 2,
                "unit_price": unit_price,
            }],
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_guest_checkout_recomputes_total(pool: PgPool) {
        let product_id = seed_product(&pool, "basket", dec!(10.00)).await;
        let server = TestServer::new(orders_router(create_test_app_state(pool, create_test_config()))).unwrap();

        let response = server.post("/orders").json(&checkout_body(product_id, "key-1", None)).await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let body: OrderResponse = response.json();
        // No offered price: the listed minimum applies
        assert_eq!(body.total_amount, dec!(20.00));
        assert_eq!(body.items[0].unit_price, dec!(10.00));
        assert!(body.user_id.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_offered_price_above_minimum_honored(pool: PgPool) {
        let product_id = seed_product(&pool, "basket", dec!(10.00)).await;
        let server = TestServer::new(orders_router(create_test_app_state(pool, create_test_config()))).unwrap();

        let body: OrderResponse = server
            .post("/orders")
            .json(&checkout_body(product_id, "key-2", Some("15.00")))
            .await
            .json();

        assert_eq!(body.items[0].unit_price, dec!(15.00));
        assert_eq!(body.total_amount, dec!(30.00));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_price_below_minimum_rejected(pool: PgPool) {
        let product_id = seed_product(&pool, "basket", dec!(10.00)).await;
        let server = TestServer::new(orders_router(create_test_app_state(pool, create_test_config()))).unwrap();

        server
            .post("/orders")
            .json(&checkout_body(product_id, "key-3", Some("9.99")))
            .await
            .assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_oversized_offered_price_rejected(pool: PgPool) {
        let product_id = seed_product(&pool, "basket", dec!(10.00)).await;
        let server = TestServer::new(orders_router(create_test_app_state(pool, create_test_config()))).unwrap();

        server
            .post("/orders")
            .json(&checkout_body(product_id, "key-7", Some("10000000000.00")))
            .await
            .assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_idempotent_resubmission_returns_original(pool: PgPool) {
        let product_id = seed_product(&pool, "basket", dec!(10.00)).await;
        let server = TestServer::new(orders_router(create_test_app_state(pool, create_test_config()))).unwrap();

        let first = server.post("/orders").json(&checkout_body(product_id, "same-key", None)).await;
        first.assert_status(axum::http::StatusCode::CREATED);
        let first: OrderResponse = first.json();

        // Same key, different contents: the original wins
        let second = server
            .post("/orders")
            .json(&checkout_body(product_id, "same-key", Some("99.00")))
            .await;
        second.assert_status_ok();
        let second: OrderResponse = second.json();

        assert_eq!(first.id, second.id);
        assert_eq!(second.total_amount, dec!(20.00));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_product_is_not_found(pool: PgPool) {
        let server = TestServer::new(orders_router(create_test_app_state(pool, create_test_config()))).unwrap();

        server
            .post("/orders")
            .json(&checkout_body(uuid::Uuid::new_v4(), "key-4", None))
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_empty_cart_rejected(pool: PgPool) {
        let server = TestServer::new(orders_router(create_test_app_state(pool, create_test_config()))).unwrap();

        server
            .post("/orders")
            .json(&json!({
                "customer_name": "Kofi",
                "customer_email": "kofi@example.com",
                "idempotency_key": "key-5",
                "items": [],
            }))
            .await
            .assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_users_only_see_their_own_orders(pool: PgPool) {
        let product_id = seed_product(&pool, "basket", dec!(10.00)).await;
        let config = create_test_config();
        let alice = seed_user(&pool, "alice", "alice@example.com", false).await;
        let bob = seed_user(&pool, "bob", "bob@example.com", false).await;
        let admin = seed_user(&pool, "admin", "admin@example.com", true).await;

        let server = TestServer::new(orders_router(create_test_app_state(pool, config.clone()))).unwrap();

        let (name, value) = session_header(&alice, &config);
        let created: OrderResponse = server
            .post("/orders")
            .add_header(name, value)
            .json(&checkout_body(product_id, "alice-key", None))
            .await
            .json();
        assert_eq!(created.user_id, Some(alice.id));

        let (name, value) = session_header(&bob, &config);
        let listed: serde_json::Value = server.get("/orders").add_header(name.clone(), value.clone()).await.json();
        assert!(listed["data"].as_array().unwrap().is_empty());

        server
            .get(&format!("/orders/{}", created.id))
            .add_header(name, value)
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);

        let (name, value) = session_header(&admin, &config);
        let listed: serde_json::Value = server.get("/orders").add_header(name, value).await.json();
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_updates_status(pool: PgPool) {
        let product_id = seed_product(&pool, "basket", dec!(10.00)).await;
        let config = create_test_config();
        let admin = seed_user(&pool, "admin", "admin@example.com", true).await;

        let server = TestServer::new(orders_router(create_test_app_state(pool, config.clone()))).unwrap();

        let created: OrderResponse = server.post("/orders").json(&checkout_body(product_id, "key-6", None)).await.json();

        let (name, value) = session_header(&admin, &config);
        let updated: OrderResponse = server
            .patch(&format!("/orders/{}", created.id))
            .add_header(name, value)
            .json(&json!({"status": "PAID"}))
            .await
            .json();

        assert_eq!(updated.status, crate::api::models::orders::OrderStatus::Paid);
    }
}
