//! Error catalog and domain -> RFC 9457 mapping.

use modkit::{ErrDef, ProblemResponse};

use crate::domain::assignment::AssigneeError;
use crate::domain::error::DomainError;
use crate::domain::membership::MembershipError;

macro_rules! err_def {
    ($name:ident, $status:expr, $title:expr, $code:literal) => {
        pub const $name: ErrDef = ErrDef {
            status: $status,
            title: $title,
            code: $code,
            type_url: concat!("https://errors.taskboard.dev/", $code),
        };
    };
}

err_def!(VALIDATION, 400, "Validation Error", "PROJECTS_VALIDATION");
err_def!(INVALID_ROLE, 400, "Invalid Role", "PROJECTS_INVALID_ROLE");
err_def!(UNKNOWN_MEMBER, 400, "Unknown Member", "PROJECTS_UNKNOWN_MEMBER");
err_def!(ASSIGNEE_NOT_MEMBER, 400, "Assignee Not A Member", "PROJECTS_ASSIGNEE_NOT_MEMBER");
err_def!(FORBIDDEN, 403, "Forbidden", "PROJECTS_FORBIDDEN");
err_def!(PROJECT_NOT_FOUND, 404, "Project Not Found", "PROJECTS_PROJECT_NOT_FOUND");
err_def!(TASK_NOT_FOUND, 404, "Task Not Found", "PROJECTS_TASK_NOT_FOUND");
err_def!(COMMENT_NOT_FOUND, 404, "Comment Not Found", "PROJECTS_COMMENT_NOT_FOUND");
err_def!(ASSIGNEE_NOT_FOUND, 404, "Assignee Not Found", "PROJECTS_ASSIGNEE_NOT_FOUND");
err_def!(ADMIN_CONFLICT, 409, "Admin Conflict", "PROJECTS_ADMIN_CONFLICT");
err_def!(DUPLICATE_MEMBER, 409, "Duplicate Member", "PROJECTS_DUPLICATE_MEMBER");
err_def!(INTERNAL, 500, "Internal Server Error", "PROJECTS_INTERNAL");

const INTERNAL_DETAIL: &str = "An internal error occurred";

/// Map domain error to RFC 9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    let detail = e.to_string();
    let problem = match e {
        DomainError::Validation { .. } => VALIDATION.to_problem(detail),
        DomainError::Forbidden { .. } => FORBIDDEN.to_problem(detail),
        DomainError::ProjectNotFound { .. } => PROJECT_NOT_FOUND.to_problem(detail),
        DomainError::TaskNotFound { .. } => TASK_NOT_FOUND.to_problem(detail),
        DomainError::CommentNotFound { .. } => COMMENT_NOT_FOUND.to_problem(detail),
        DomainError::Membership(m) => match m {
            MembershipError::InvalidRole { .. } => INVALID_ROLE.to_problem(detail),
            MembershipError::UnknownMember { .. } => UNKNOWN_MEMBER.to_problem(detail),
            MembershipError::AdminConflict { .. } => ADMIN_CONFLICT.to_problem(detail),
            MembershipError::DuplicateMember { .. } => DUPLICATE_MEMBER.to_problem(detail),
            MembershipError::Directory { .. } => {
                tracing::error!(error = ?e, "User directory failure");
                INTERNAL.to_problem(INTERNAL_DETAIL)
            }
        },
        DomainError::Assignee(a) => match a {
            AssigneeError::NotFound { .. } => ASSIGNEE_NOT_FOUND.to_problem(detail),
            AssigneeError::NotMember { .. } => ASSIGNEE_NOT_MEMBER.to_problem(detail),
            AssigneeError::Directory { .. } => {
                tracing::error!(error = ?e, "User directory failure");
                INTERNAL.to_problem(INTERNAL_DETAIL)
            }
        },
        DomainError::Database { .. } => {
            // Log the details, never return them.
            tracing::error!(error = ?e, "Database error occurred");
            INTERNAL.to_problem(INTERNAL_DETAIL)
        }
    };
    ProblemResponse(problem.with_instance(instance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(e: DomainError) -> u16 {
        map_domain_error(&e, "/x").0.status
    }

    #[test]
    fn taxonomy_maps_to_http_statuses() {
        let id = Uuid::new_v4();
        assert_eq!(status_of(DomainError::validation("title", "empty")), 400);
        assert_eq!(
            status_of(MembershipError::InvalidRole { role: "x".into() }.into()),
            400
        );
        assert_eq!(
            status_of(MembershipError::UnknownMember { users: vec![id] }.into()),
            400
        );
        assert_eq!(status_of(AssigneeError::NotMember { user: id }.into()), 400);
        assert_eq!(status_of(DomainError::forbidden("no")), 403);
        assert_eq!(status_of(DomainError::project_not_found(id)), 404);
        assert_eq!(status_of(AssigneeError::NotFound { user: id }.into()), 404);
        assert_eq!(status_of(MembershipError::AdminConflict { user: id }.into()), 409);
        assert_eq!(status_of(MembershipError::DuplicateMember { user: id }.into()), 409);
        assert_eq!(status_of(DomainError::database("locked")), 500);
    }

    #[test]
    fn internal_failures_hide_detail() {
        let p = map_domain_error(
            &AssigneeError::Directory {
                message: "10.0.0.7 refused".into(),
            }
            .into(),
            "/tasks",
        )
        .0;
        assert_eq!(p.status, 500);
        assert_eq!(p.detail, INTERNAL_DETAIL);
        assert_eq!(p.code, "PROJECTS_INTERNAL");
    }

    #[test]
    fn catalog_type_urls_embed_code() {
        assert_eq!(
            ADMIN_CONFLICT.type_url,
            "https://errors.taskboard.dev/PROJECTS_ADMIN_CONFLICT"
        );
    }
}
