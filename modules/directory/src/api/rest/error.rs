use modkit::{ErrDef, ProblemResponse};

use crate::domain::error::DomainError;

pub const USER_NOT_FOUND: ErrDef = ErrDef {
    status: 404,
    title: "User Not Found",
    code: "DIRECTORY_USER_NOT_FOUND",
    type_url: "https://errors.taskboard.dev/DIRECTORY_USER_NOT_FOUND",
};

pub const EMAIL_CONFLICT: ErrDef = ErrDef {
    status: 409,
    title: "Email Already Exists",
    code: "DIRECTORY_EMAIL_CONFLICT",
    type_url: "https://errors.taskboard.dev/DIRECTORY_EMAIL_CONFLICT",
};

pub const VALIDATION: ErrDef = ErrDef {
    status: 400,
    title: "Validation Error",
    code: "DIRECTORY_VALIDATION",
    type_url: "https://errors.taskboard.dev/DIRECTORY_VALIDATION",
};

pub const INTERNAL: ErrDef = ErrDef {
    status: 500,
    title: "Internal Server Error",
    code: "DIRECTORY_INTERNAL",
    type_url: "https://errors.taskboard.dev/DIRECTORY_INTERNAL",
};

/// Map a domain error to an RFC 9457 response for `instance`.
pub fn domain_error_to_problem(e: &DomainError, instance: &str) -> ProblemResponse {
    let problem = match e {
        DomainError::UserNotFound { .. } => USER_NOT_FOUND.to_problem(e.to_string()),
        DomainError::EmailAlreadyExists { .. } => EMAIL_CONFLICT.to_problem(e.to_string()),
        DomainError::InvalidEmail { .. }
        | DomainError::EmptyFullName
        | DomainError::FullNameTooLong { .. }
        | DomainError::Validation { .. } => VALIDATION.to_problem(e.to_string()),
        DomainError::Database { message } => {
            tracing::error!(%message, "directory storage failure");
            INTERNAL.to_problem("An internal error occurred")
        }
    };
    ProblemResponse(problem.with_instance(instance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn not_found_maps_to_404_with_code() {
        let p = domain_error_to_problem(&DomainError::user_not_found(Uuid::nil()), "/users/x").0;
        assert_eq!(p.status, 404);
        assert_eq!(p.code, "DIRECTORY_USER_NOT_FOUND");
        assert_eq!(p.instance, "/users/x");
    }

    #[test]
    fn database_detail_is_not_leaked() {
        let p = domain_error_to_problem(&DomainError::database("disk I/O error"), "/users/me").0;
        assert_eq!(p.status, 500);
        assert!(!p.detail.contains("disk"));
    }
}
