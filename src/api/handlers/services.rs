use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        pagination::PaginatedResponse,
        services::{ListServicesQuery, ServiceCreate, ServiceResponse, ServiceUpdate},
        users::CurrentUser,
    },
    auth::permissions::require_admin,
    db::handlers::{services::ServiceFilter, Repository, Services},
    errors::{Error, Result},
    types::{Operation, Resource, ServiceId},
    AppState,
};

/// List services (public)
#[utoipa::path(
    get,
    path = "/services",
    tag = "services",
    params(ListServicesQuery),
    responses(
        (status = 200, description = "List of services", body = PaginatedResponse<ServiceResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_services(
    State(state): State<AppState>,
    current_user: Option<CurrentUser>,
    Query(query): Query<ListServicesQuery>,
) -> Result<Json<PaginatedResponse<ServiceResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut filter = ServiceFilter::new(skip, limit);
    let is_admin = current_user.as_ref().is_some_and(|u| u.is_admin);
    if query.include_inactive.unwrap_or(false) && is_admin {
        filter.active_only = false;
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Services::new(&mut conn);

    let services = repo.list(&filter).await?;
    let data = services.into_iter().map(ServiceResponse::from).collect();

    Ok(Json(PaginatedResponse::new(data, skip, limit)))
}

/// Get a single service (public)
#[utoipa::path(
    get,
    path = "/services/{id}",
    tag = "services",
    params(("id" = String, Path, format = "uuid", description = "Service id")),
    responses(
        (status = 200, description = "Service", body = ServiceResponse),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_service(State(state): State<AppState>, Path(id): Path<ServiceId>) -> Result<Json<ServiceResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Services::new(&mut conn);

    let service = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "service".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ServiceResponse::from(service)))
}

/// Create a service (admin only)
#[utoipa::path(
    post,
    path = "/services",
    request_body = ServiceCreate,
    tag = "services",
    responses(
        (status = 201, description = "Service created", body = ServiceResponse),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Slug already taken"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_service(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ServiceCreate>,
) -> Result<(StatusCode, Json<ServiceResponse>)> {
    require_admin(&current_user, Resource::Services, Operation::CreateAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Services::new(&mut conn);

    let service = repo.create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(ServiceResponse::from(service))))
}

/// Update a service (admin only)
#[utoipa::path(
    patch,
    path = "/services/{id}",
    request_body = ServiceUpdate,
    tag = "services",
    params(("id" = String, Path, format = "uuid", description = "Service id")),
    responses(
        (status = 200, description = "Service updated", body = ServiceResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_service(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ServiceId>,
    Json(request): Json<ServiceUpdate>,
) -> Result<Json<ServiceResponse>> {
    require_admin(&current_user, Resource::Services, Operation::UpdateAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Services::new(&mut conn);

    let service = repo.update(id, &request.into()).await?;
    Ok(Json(ServiceResponse::from(service)))
}

/// Delete a service (admin only)
#[utoipa::path(
    delete,
    path = "/services/{id}",
    tag = "services",
    params(("id" = String, Path, format = "uuid", description = "Service id")),
    responses(
        (status = 204, description = "Service deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_service(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ServiceId>,
) -> Result<StatusCode> {
    require_admin(&current_user, Resource::Services, Operation::DeleteAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Services::new(&mut conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "service".to_string(),
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

    fn services_router(state: AppState) -> Router {
        Router::new()
            .route("/services", get(list_services).post(create_service))
            .route("/services/{id}", get(get_service).patch(update_service).delete(delete_service))
            .with_state(state)
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_creates_and_public_lists(pool: PgPool) {
        let config = create_test_config();
        let admin = seed_user(&pool, "admin", "admin@example.com", true).await;

        let server = TestServer::new(services_router(create_test_app_state(pool, config.clone()))).unwrap();

        let (name, value) = session_header(&admin, &config);
        server
            .post("/services")
            .add_header(name, value)
            .json(&json!({"name": "Bill Payments", "slug": "bill-payments"}))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let listed: serde_json::Value = server.get("/services").await.json();
        assert_eq!(listed["data"][0]["slug"], "bill-payments");
    }
}
