use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        categories::{CategoryCreate, CategoryResponse, CategoryUpdate, ListCategoriesQuery},
        pagination::PaginatedResponse,
        users::CurrentUser,
    },
    auth::permissions::require_admin,
    db::handlers::{categories::CategoryFilter, Categories, Repository},
    errors::{Error, Result},
    types::{CategoryId, Operation, Resource},
    AppState,
};

/// List categories (public)
#[utoipa::path(
    get,
    path = "/categories",
    tag = "catalog",
    params(ListCategoriesQuery),
    responses(
        (status = 200, description = "List of categories", body = PaginatedResponse<CategoryResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<PaginatedResponse<CategoryResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut conn);

    let categories = repo.list(&CategoryFilter::new(skip, limit)).await?;
    let data = categories.into_iter().map(CategoryResponse::from).collect();

    Ok(Json(PaginatedResponse::new(data, skip, limit)))
}

/// Get a single category (public)
#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "catalog",
    params(("id" = String, Path, format = "uuid", description = "Category id")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_category(State(state): State<AppState>, Path(id): Path<CategoryId>) -> Result<Json<CategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut conn);

    let category = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "category".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(CategoryResponse::from(category)))
}

/// Create a category (admin only)
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CategoryCreate,
    tag = "catalog",
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Slug already taken"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    require_admin(&current_user, Resource::Categories, Operation::CreateAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut conn);

    let category = repo.create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

/// Update a category (admin only)
#[utoipa::path(
    patch,
    path = "/categories/{id}",
    request_body = CategoryUpdate,
    tag = "catalog",
    params(("id" = String, Path, format = "uuid", description = "Category id")),
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CategoryId>,
    Json(request): Json<CategoryUpdate>,
) -> Result<Json<CategoryResponse>> {
    require_admin(&current_user, Resource::Categories, Operation::UpdateAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut conn);

    let category = repo.update(id, &request.into()).await?;
    Ok(Json(CategoryResponse::from(category)))
}

/// Delete a category (admin only)
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "catalog",
    params(("id" = String, Path, format = "uuid", description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    require_admin(&current_user, Resource::Categories, Operation::DeleteAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "category".to_string(),
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

    fn categories_router(state: AppState) -> Router {
        Router::new()
            .route("/categories", get(list_categories).post(create_category))
            .route(
                "/categories/{id}",
                get(get_category).patch(update_category).delete(delete_category),
            )
            .with_state(state)
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_requires_admin(pool: PgPool) {
        let config = create_test_config();
        let user = seed_user(&pool, "shopper", "shopper@example.com", false).await;
        let admin = seed_user(&pool, "admin", "admin@example.com", true).await;

        let server = TestServer::new(categories_router(create_test_app_state(pool, config.clone()))).unwrap();
        let body = json!({"name": "Gift Cards", "slug": "gift-cards", "description": null});

        let (name, value) = session_header(&user, &config);
        server
            .post("/categories")
            .add_header(name, value)
            .json(&body)
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);

        let (name, value) = session_header(&admin, &config);
        let response = server.post("/categories").add_header(name, value).json(&body).await;
        response.assert_status(axum::http::StatusCode::CREATED);

        // Listing is public
        let listed = server.get("/categories").await;
        listed.assert_status_ok();
        let body: serde_json::Value = listed.json();
        assert_eq!(body["data"][0]["slug"], "gift-cards");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_slug_conflicts(pool: PgPool) {
        let config = create_test_config();
        let admin = seed_user(&pool, "admin", "admin@example.com", true).await;

        let server = TestServer::new(categories_router(create_test_app_state(pool, config.clone()))).unwrap();
        let body = json!({"name": "Hampers", "slug": "hampers"});

        let (name, value) = session_header(&admin, &config);
        server
            .post("/categories")
            .add_header(name.clone(), value.clone())
            .json(&body)
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        server
            .post("/categories")
            .add_header(name, value)
            .json(&body)
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);
    }
}
