//! HTTP surface shared by REST modules: RFC 9457 problems, the error catalog
//! entry type, and the OpenAPI registration seam.

pub mod problem;

use http::StatusCode;
use utoipa::openapi::OpenApi;

use problem::Problem;

/// Collects OpenAPI documents from REST modules. The REST host merges them
/// into the single document it serves.
pub trait OpenApiRegistry: Send + Sync {
    fn register_doc(&self, module: &str, doc: OpenApi);

    fn as_any(&self) -> &dyn std::any::Any;
}

/// Static error definition from a module's error catalog.
#[derive(Debug, Clone, Copy)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
    pub type_url: &'static str,
}

impl ErrDef {
    /// Convert this error definition into a Problem with the given detail.
    #[inline]
    pub fn to_problem(&self, detail: impl Into<String>) -> Problem {
        Problem::new(
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            self.title,
            detail.into(),
        )
        .with_code(self.code)
        .with_type(self.type_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn err_def_to_problem_carries_catalog_fields() {
        let def = ErrDef {
            status: 409,
            title: "Conflict",
            code: "PROJECTS_ADMIN_CONFLICT",
            type_url: "https://errors.taskboard.dev/PROJECTS_ADMIN_CONFLICT",
        };

        let problem = def.to_problem("second admin");
        assert_eq!(problem.status, 409);
        assert_eq!(problem.title, "Conflict");
        assert_eq!(problem.detail, "second admin");
        assert_eq!(problem.code, "PROJECTS_ADMIN_CONFLICT");
        assert_eq!(
            problem.type_url,
            "https://errors.taskboard.dev/PROJECTS_ADMIN_CONFLICT"
        );
    }

    #[test]
    fn invalid_status_falls_back_to_500() {
        let def = ErrDef {
            status: 42,
            title: "Broken",
            code: "BROKEN",
            type_url: "about:blank",
        };
        assert_eq!(def.to_problem("x").status, 500);
    }
}
