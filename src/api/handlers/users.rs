use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        pagination::PaginatedResponse,
        users::{CurrentUser, ListUsersQuery, UserCreate, UserResponse, UserUpdate},
    },
    auth::permissions::require_admin,
    db::{
        handlers::{users::UserFilter, Repository, Users},
        models::users::UserUpdateDBRequest,
    },
    errors::{Error, Result},
    types::{Operation, Resource, UserId},
    AppState,
};

/// Get the current authenticated user's profile
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_current_user(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let user = repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "user".to_string(),
        id: current_user.id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}

/// Update the current authenticated user's profile
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UserUpdate,
    tag = "users",
    responses(
        (status = 200, description = "Updated user profile", body = UserResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_current_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let update = UserUpdateDBRequest {
        display_name: request.display_name,
        phone: request.phone,
        ..Default::default()
    };

    let user = repo.update(current_user.id, &update).await?;
    Ok(Json(UserResponse::from(user)))
}

/// List all users (admin only)
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "List of users", body = PaginatedResponse<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<PaginatedResponse<UserResponse>>> {
    require_admin(&current_user, Resource::Users, Operation::ReadAll)?;

    let (skip, limit) = query.pagination.params();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let users = repo.list(&UserFilter::new(skip, limit)).await?;
    let data = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(PaginatedResponse::new(data, skip, limit)))
}

/// Provision a user account (admin only). The account has no password until
/// the user sets one; it cannot be made an admin through this endpoint.
#[utoipa::path(
    post,
    path = "/users",
    request_body = UserCreate,
    tag = "users",
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Username or email already taken"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    require_admin(&current_user, Resource::Users, Operation::CreateAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let user = repo.create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Get a user by id (admin only)
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = String, Path, format = "uuid", description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>> {
    require_admin(&current_user, Resource::Users, Operation::ReadAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let user = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "user".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete a user (admin only)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = String, Path, format = "uuid", description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(State(state): State<AppState>, current_user: CurrentUser, Path(id): Path<UserId>) -> Result<StatusCode> {
    require_admin(&current_user, Resource::Users, Operation::DeleteAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "user".to_string(),
            id: id.to_string(),
        })
    }
}
