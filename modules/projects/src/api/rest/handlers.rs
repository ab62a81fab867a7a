use std::sync::Arc;

use axum::{
    extract::Path,
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use modkit::{Problem, ProblemResponse, SecurityCtx};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::rest::dto::{
    parse_status, CommentDto, CreateCommentReq, CreateProjectReq, CreateTaskReq, ProjectDto,
    ProjectMemberDto, TaskDto, UpdateProjectReq, UpdateStatusReq, UpdateTaskReq,
};
use crate::api::rest::error::map_domain_error;
use crate::contract::model::{NewTask, TaskPatch};
use crate::domain::error::DomainError;
use crate::domain::service::Service;

type ApiResult<T> = Result<T, ProblemResponse>;

/// Client errors are routine here; server-side failures are logged by the mapper.
fn fail(e: DomainError, uri: &Uri) -> ProblemResponse {
    let resp = map_domain_error(&e, uri.path());
    if resp.0.status < 500 {
        warn!(path = uri.path(), status = resp.0.status, "Request rejected: {}", e);
    }
    resp
}

fn many<T, D: From<T>>(items: Vec<T>) -> Json<Vec<D>> {
    Json(items.into_iter().map(D::from).collect())
}

// ---- Projects ----

/// Create a project; the caller becomes owner and admin
#[utoipa::path(
    post,
    path = "/projects",
    tag = "projects",
    security(("bearerAuth" = [])),
    request_body = CreateProjectReq,
    responses(
        (status = 201, description = "Project created", body = ProjectDto),
        (status = 400, description = "Invalid title, role or unknown member", body = Problem),
        (status = 409, description = "Duplicate member", body = Problem),
    )
)]
pub async fn create_project(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Json(req): Json<CreateProjectReq>,
) -> ApiResult<(StatusCode, Json<ProjectDto>)> {
    info!(actor = %ctx.subject, "Creating project");
    let project = svc
        .create_project(ctx.subject, req.into())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok((StatusCode::CREATED, Json(project.into())))
}

/// Projects the caller owns or belongs to
#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "Projects", body = [ProjectDto]))
)]
pub async fn list_projects(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
) -> ApiResult<Json<Vec<ProjectDto>>> {
    svc.list_projects(ctx.subject)
        .await
        .map(many)
        .map_err(|e| fail(e, &uri))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "projects",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project", body = ProjectDto),
        (status = 403, description = "Not a member", body = Problem),
        (status = 404, description = "Unknown project", body = Problem),
    )
)]
pub async fn get_project(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDto>> {
    svc.get_project(ctx.subject, id)
        .await
        .map(|p| Json(p.into()))
        .map_err(|e| fail(e, &uri))
}

/// Update title, description or members. Admin only
#[utoipa::path(
    patch,
    path = "/projects/{id}",
    tag = "projects",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = UpdateProjectReq,
    responses(
        (status = 200, description = "Updated project", body = ProjectDto),
        (status = 400, description = "Invalid input", body = Problem),
        (status = 403, description = "Caller is not the admin", body = Problem),
        (status = 404, description = "Unknown project", body = Problem),
        (status = 409, description = "Duplicate member", body = Problem),
    )
)]
pub async fn update_project(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectReq>,
) -> ApiResult<Json<ProjectDto>> {
    svc.update_project(ctx.subject, id, req.into())
        .await
        .map(|p| Json(p.into()))
        .map_err(|e| fail(e, &uri))
}

/// Delete a project with its tasks and comments. Owner only
#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "projects",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Caller is not the owner", body = Problem),
        (status = 404, description = "Unknown project", body = Problem),
    )
)]
pub async fn delete_project(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    svc.delete_project(ctx.subject, id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| fail(e, &uri))
}

#[utoipa::path(
    get,
    path = "/projects/{id}/members",
    tag = "projects",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Members with profiles", body = [ProjectMemberDto]),
        (status = 403, description = "Not a member", body = Problem),
    )
)]
pub async fn list_project_members(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProjectMemberDto>>> {
    svc.list_project_members(ctx.subject, id)
        .await
        .map(many)
        .map_err(|e| fail(e, &uri))
}

// ---- Tasks ----

/// Create a task. Admin or project manager only
#[utoipa::path(
    post,
    path = "/projects/{id}/tasks",
    tag = "tasks",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = CreateTaskReq,
    responses(
        (status = 201, description = "Task created", body = TaskDto),
        (status = 400, description = "Invalid input or assignee not a member", body = Problem),
        (status = 403, description = "Caller cannot create tasks", body = Problem),
        (status = 404, description = "Unknown project or assignee", body = Problem),
    )
)]
pub async fn create_task(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskReq>,
) -> ApiResult<(StatusCode, Json<TaskDto>)> {
    let new_task = NewTask::try_from(req).map_err(|e| fail(e, &uri))?;
    let task = svc
        .create_task(ctx.subject, project_id, new_task)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

#[utoipa::path(
    get,
    path = "/projects/{id}/tasks",
    tag = "tasks",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project tasks", body = [TaskDto]),
        (status = 403, description = "Not a member", body = Problem),
    )
)]
pub async fn list_project_tasks(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TaskDto>>> {
    svc.list_project_tasks(ctx.subject, project_id)
        .await
        .map(many)
        .map_err(|e| fail(e, &uri))
}

/// Tasks the caller created or is assigned to
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "Tasks", body = [TaskDto]))
)]
pub async fn list_my_tasks(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
) -> ApiResult<Json<Vec<TaskDto>>> {
    svc.list_my_tasks(ctx.subject)
        .await
        .map(many)
        .map_err(|e| fail(e, &uri))
}

#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task", body = TaskDto),
        (status = 403, description = "No access", body = Problem),
        (status = 404, description = "Unknown task", body = Problem),
    )
)]
pub async fn get_task(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskDto>> {
    svc.get_task(ctx.subject, id)
        .await
        .map(|t| Json(t.into()))
        .map_err(|e| fail(e, &uri))
}

/// Partial update. A status-only body is also open to the creator and assignee
#[utoipa::path(
    patch,
    path = "/tasks/{id}",
    tag = "tasks",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = UpdateTaskReq,
    responses(
        (status = 200, description = "Updated task", body = TaskDto),
        (status = 400, description = "Invalid input or assignee not a member", body = Problem),
        (status = 403, description = "Caller cannot update this task", body = Problem),
        (status = 404, description = "Unknown task or assignee", body = Problem),
    )
)]
pub async fn update_task(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskReq>,
) -> ApiResult<Json<TaskDto>> {
    let patch = TaskPatch::try_from(req).map_err(|e| fail(e, &uri))?;
    svc.update_task(ctx.subject, id, patch)
        .await
        .map(|t| Json(t.into()))
        .map_err(|e| fail(e, &uri))
}

/// Change status. Creator or assignee only
#[utoipa::path(
    patch,
    path = "/tasks/{id}/status",
    tag = "tasks",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Updated task", body = TaskDto),
        (status = 400, description = "Unknown status", body = Problem),
        (status = 403, description = "Caller is neither creator nor assignee", body = Problem),
    )
)]
pub async fn update_task_status(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusReq>,
) -> ApiResult<Json<TaskDto>> {
    let status = parse_status(&req.status).map_err(|e| fail(e, &uri))?;
    svc.update_task_status(ctx.subject, id, status)
        .await
        .map(|t| Json(t.into()))
        .map_err(|e| fail(e, &uri))
}

/// Delete a task and its comments. Any project member
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "tasks",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not a member", body = Problem),
        (status = 404, description = "Unknown task", body = Problem),
    )
)]
pub async fn delete_task(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    svc.delete_task(ctx.subject, id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| fail(e, &uri))
}

// ---- Comments ----

#[utoipa::path(
    post,
    path = "/tasks/{id}/comments",
    tag = "comments",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = CreateCommentReq,
    responses(
        (status = 201, description = "Comment created", body = CommentDto),
        (status = 400, description = "Empty or too long", body = Problem),
        (status = 403, description = "Caller is neither creator nor assignee", body = Problem),
    )
)]
pub async fn create_comment(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CreateCommentReq>,
) -> ApiResult<(StatusCode, Json<CommentDto>)> {
    let comment = svc
        .create_comment(ctx.subject, task_id, &req.text)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

#[utoipa::path(
    get,
    path = "/tasks/{id}/comments",
    tag = "comments",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Comments, oldest first", body = [CommentDto]),
        (status = 403, description = "Caller is neither creator nor assignee", body = Problem),
    )
)]
pub async fn list_comments(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentDto>>> {
    svc.list_comments(ctx.subject, task_id)
        .await
        .map(many)
        .map_err(|e| fail(e, &uri))
}

#[utoipa::path(
    delete,
    path = "/comments/{id}",
    tag = "comments",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not allowed", body = Problem),
        (status = 404, description = "Unknown comment", body = Problem),
    )
)]
pub async fn delete_comment(
    Extension(svc): Extension<Arc<Service>>,
    ctx: SecurityCtx,
    uri: Uri,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    svc.delete_comment(ctx.subject, id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| fail(e, &uri))
}
