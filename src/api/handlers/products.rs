use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;

use crate::{
    api::models::{
        pagination::PaginatedResponse,
        products::{ListProductsQuery, ProductCreate, ProductResponse, ProductUpdate},
        users::CurrentUser,
    },
    auth::permissions::require_admin,
    db::{
        handlers::{products::ProductFilter, Products, Repository},
        models::products::ProductCreateDBRequest,
    },
    errors::{Error, Result},
    types::{Operation, ProductId, Resource},
    AppState,
};

/// List products (public). Inactive products only show up for admins who
/// ask for them.
#[utoipa::path(
    get,
    path = "/products",
    tag = "catalog",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "List of products", body = PaginatedResponse<ProductResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_products(
    State(state): State<AppState>,
    current_user: Option<CurrentUser>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<PaginatedResponse<ProductResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut filter = ProductFilter::new(skip, limit);
    if let Some(category_id) = query.category_id {
        filter = filter.with_category(category_id);
    }
    if let Some(search) = query.search.filter(|s| !s.trim().is_empty()) {
        filter = filter.with_search(search);
    }
    let is_admin = current_user.as_ref().is_some_and(|u| u.is_admin);
    if query.include_inactive.unwrap_or(false) && is_admin {
        filter = filter.include_inactive();
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Products::new(&mut conn);

    let products = repo.list(&filter).await?;
    let data = products.into_iter().map(ProductResponse::from).collect();

    Ok(Json(PaginatedResponse::new(data, skip, limit)))
}

/// Get a single product (public)
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "catalog",
    params(("id" = String, Path, format = "uuid", description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_product(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<Json<ProductResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Products::new(&mut conn);

    let product = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "product".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ProductResponse::from(product)))
}

/// Create a product (admin only)
#[utoipa::path(
    post,
    path = "/products",
    request_body = ProductCreate,
    tag = "catalog",
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Slug already taken"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ProductCreate>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    require_admin(&current_user, Resource::Products, Operation::CreateAll)?;

    if request.min_price < Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "Minimum price must not be negative".to_string(),
        });
    }

    let create_request = ProductCreateDBRequest {
        category_id: request.category_id,
        name: request.name,
        slug: request.slug,
        description: request.description,
        image_url: request.image_url,
        min_price: request.min_price,
        currency: request.currency.unwrap_or_else(|| state.config.default_currency.clone()),
        created_by: Some(current_user.id),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Products::new(&mut conn);

    let product = repo.create(&create_request).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

/// Update a product (admin only)
#[utoipa::path(
    patch,
    path = "/products/{id}",
    request_body = ProductUpdate,
    tag = "catalog",
    params(("id" = String, Path, format = "uuid", description = "Product id")),
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ProductId>,
    Json(request): Json<ProductUpdate>,
) -> Result<Json<ProductResponse>> {
    require_admin(&current_user, Resource::Products, Operation::UpdateAll)?;

    if request.min_price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(Error::BadRequest {
            message: "Minimum price must not be negative".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Products::new(&mut conn);

    let product = repo.update(id, &request.into()).await?;
    Ok(Json(ProductResponse::from(product)))
}

/// Delete a product (admin only)
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "catalog",
    params(("id" = String, Path, format = "uuid", description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    require_admin(&current_user, Resource::Products, Operation::DeleteAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Products::new(&mut conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "product".to_string(),
            id: id.to_string(),
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

    fn products_router(state: AppState) -> Router {
        Router::new()
            .route("/products", get(list_products).post(create_product))
            .route("/products/{id}", get(get_product).patch(update_product).delete(delete_product))
            .with_state(state)
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_list_products(pool: PgPool) {
        let config = create_test_config();
        let admin = seed_user(&pool, "admin", "admin@example.com", true).await;

        let server = TestServer::new(products_router(create_test_app_state(pool, config.clone()))).unwrap();

        let (name, value) = session_header(&admin, &config);
        let response = server
            .post("/products")
            .add_header(name, value)
            .json(&json!({
                "category_id": null,
                "name": "Fruit Basket",
                "slug": "fruit-basket",
                "min_price": "25.00",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let body: ProductResponse = response.json();
        assert_eq!(body.currency, "USD");
        assert_eq!(body.created_by, Some(admin.id));

        let listed = server.get("/products").await;
        listed.assert_status_ok();
        let listed: serde_json::Value = listed.json();
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_inactive_products_hidden_from_public(pool: PgPool) {
        let config = create_test_config();
        let admin = seed_user(&pool, "admin", "admin@example.com", true).await;

        let server = TestServer::new(products_router(create_test_app_state(pool, config.clone()))).unwrap();

        let (name, value) = session_header(&admin, &config);
        let created: ProductResponse = server
            .post("/products")
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "Hidden", "slug": "hidden", "min_price": "1.00"}))
            .await
            .json();

        server
            .patch(&format!("/products/{}", created.id))
            .add_header(name.clone(), value.clone())
            .json(&json!({"is_active": false}))
            .await
            .assert_status_ok();

        let public: serde_json::Value = server.get("/products").await.json();
        assert!(public["data"].as_array().unwrap().is_empty());

        let admin_view: serde_json::Value = server
            .get("/products?include_inactive=true")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(admin_view["data"].as_array().unwrap().len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_filters_listing(pool: PgPool) {
        let config = create_test_config();
        let admin = seed_user(&pool, "admin", "admin@example.com", true).await;

        let server = TestServer::new(products_router(create_test_app_state(pool, config.clone()))).unwrap();

        let (name, value) = session_header(&admin, &config);
        for (product_name, slug) in [("Gift Basket", "gift-basket"), ("Mug", "mug")] {
            server
                .post("/products")
                .add_header(name.clone(), value.clone())
                .json(&json!({"name": product_name, "slug": slug, "min_price": "5.00"}))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let found: serde_json::Value = server.get("/products?search=basket").await.json();
        let data = found["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["name"], "Gift Basket");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_non_admin_cannot_create(pool: PgPool) {
        let config = create_test_config();
        let user = seed_user(&pool, "shopper", "shopper@example.com", false).await;

        let server = TestServer::new(products_router(create_test_app_state(pool, config.clone()))).unwrap();

        let (name, value) = session_header(&user, &config);
        server
            .post("/products")
            .add_header(name, value)
            .json(&json!({"name": "Nope", "slug": "nope", "min_price": "1.00"}))
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);
    }
}
