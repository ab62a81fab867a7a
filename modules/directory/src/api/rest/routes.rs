use std::sync::Arc;

use axum::{
    routing::get,
    Extension, Router,
};
use modkit::{OpenApiRegistry, Problem};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_me,
        handlers::put_me,
        handlers::search_users,
        handlers::get_user,
    ),
    components(schemas(dto::UserDto, dto::UpdateProfileReq, Problem)),
    tags((name = "directory", description = "User profiles"))
)]
pub struct DirectoryApiDoc;

/// Mount the directory routes on `router` and publish their OpenAPI document.
pub fn register_routes(
    router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
) -> anyhow::Result<Router> {
    // `/users/search` is a static segment and wins over `/users/{id}`.
    let users = Router::new()
        .route("/users/me", get(handlers::get_me).put(handlers::put_me))
        .route("/users/search", get(handlers::search_users))
        .route("/users/{id}", get(handlers::get_user))
        .layer(Extension(service));

    openapi.register_doc(crate::MODULE_NAME, DirectoryApiDoc::openapi());
    Ok(router.merge(users))
}
