use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::Uri,
    response::Json,
    Extension,
};
use modkit::{Problem, ProblemResponse, SecurityCtx};
use tracing::info;
use uuid::Uuid;

use crate::api::rest::dto::{SearchUsersQuery, UpdateProfileReq, UserDto};
use crate::api::rest::error::domain_error_to_problem;
use crate::domain::service::Service;

type ApiResult<T> = Result<Json<T>, ProblemResponse>;

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "directory",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current profile", body = UserDto),
        (status = 404, description = "Profile not created yet", body = Problem),
    )
)]
pub async fn get_me(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
) -> ApiResult<UserDto> {
    svc.get_user(ctx.subject)
        .await
        .map(|u| Json(UserDto::from(u)))
        .map_err(|e| domain_error_to_problem(&e, uri.path()))
}

/// Create or update the profile of the authenticated user
#[utoipa::path(
    put,
    path = "/users/me",
    tag = "directory",
    security(("bearerAuth" = [])),
    request_body = UpdateProfileReq,
    responses(
        (status = 200, description = "Saved profile", body = UserDto),
        (status = 400, description = "Invalid email or name", body = Problem),
        (status = 409, description = "Email taken by another user", body = Problem),
    )
)]
pub async fn put_me(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Json(req): Json<UpdateProfileReq>,
) -> ApiResult<UserDto> {
    info!(user_id = %ctx.subject, "Saving profile");
    svc.upsert_profile(ctx.subject, req.into())
        .await
        .map(|u| Json(UserDto::from(u)))
        .map_err(|e| domain_error_to_problem(&e, uri.path()))
}

/// Search users by email fragment
#[utoipa::path(
    get,
    path = "/users/search",
    tag = "directory",
    security(("bearerAuth" = [])),
    params(SearchUsersQuery),
    responses(
        (status = 200, description = "Matching users", body = [UserDto]),
        (status = 400, description = "Blank keyword", body = Problem),
    )
)]
pub async fn search_users(
    Extension(svc): Extension<Arc<Service>>,
    _ctx: SecurityCtx,
    uri: Uri,
    Query(query): Query<SearchUsersQuery>,
) -> ApiResult<Vec<UserDto>> {
    svc.search_by_email(&query.keyword)
        .await
        .map(|users| Json(users.into_iter().map(UserDto::from).collect()))
        .map_err(|e| domain_error_to_problem(&e, uri.path()))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "directory",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserDto),
        (status = 404, description = "Unknown user", body = Problem),
    )
)]
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    _ctx: SecurityCtx,
    uri: Uri,
    Path(id): Path<Uuid>,
) -> ApiResult<UserDto> {
    svc.get_user(id)
        .await
        .map(|u| Json(UserDto::from(u)))
        .map_err(|e| domain_error_to_problem(&e, uri.path()))
}
