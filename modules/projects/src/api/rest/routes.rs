use std::sync::Arc;

use axum::{
    routing::{delete, get, patch},
    Extension, Router,
};
use modkit::{OpenApiRegistry, Problem};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_project,
        handlers::list_projects,
        handlers::get_project,
        handlers::update_project,
        handlers::delete_project,
        handlers::list_project_members,
        handlers::create_task,
        handlers::list_project_tasks,
        handlers::list_my_tasks,
        handlers::get_task,
        handlers::update_task,
        handlers::update_task_status,
        handlers::delete_task,
        handlers::create_comment,
        handlers::list_comments,
        handlers::delete_comment,
    ),
    components(schemas(
        dto::MemberDto,
        dto::ProjectDto,
        dto::CreateProjectReq,
        dto::UpdateProjectReq,
        dto::ProjectMemberDto,
        dto::TaskDto,
        dto::CreateTaskReq,
        dto::UpdateTaskReq,
        dto::UpdateStatusReq,
        dto::CreateCommentReq,
        dto::CommentDto,
        dto::CommentAuthorDto,
        Problem,
    )),
    tags(
        (name = "projects", description = "Projects and memberships"),
        (name = "tasks", description = "Tasks within projects"),
        (name = "comments", description = "Task comments"),
    )
)]
pub struct ProjectsApiDoc;

/// Mount project, task and comment routes and publish their OpenAPI document.
pub fn register_routes(
    router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
) -> anyhow::Result<Router> {
    let routes = Router::new()
        .route(
            "/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/projects/{id}",
            get(handlers::get_project)
                .patch(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route("/projects/{id}/members", get(handlers::list_project_members))
        .route(
            "/projects/{id}/tasks",
            get(handlers::list_project_tasks).post(handlers::create_task),
        )
        .route("/tasks", get(handlers::list_my_tasks))
        .route(
            "/tasks/{id}",
            get(handlers::get_task)
                .patch(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/tasks/{id}/status", patch(handlers::update_task_status))
        .route(
            "/tasks/{id}/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route("/comments/{id}", delete(handlers::delete_comment))
        .layer(Extension(service));

    openapi.register_doc(crate::MODULE_NAME, ProjectsApiDoc::openapi());
    Ok(router.merge(routes))
}
