use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// RFC 9457 Problem Details for HTTP APIs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(title = "Problem", description = "RFC 9457 Problem Details for HTTP APIs")]
pub struct Problem {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence of the problem.
    pub status: u16,
    /// A human-readable explanation specific to this occurrence of the problem.
    pub detail: String,
    /// The request path this problem occurred on.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance: String,
    /// Machine-readable error code from the module's catalog.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Field-level errors for 400 problems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(title = "ValidationError")]
pub struct ValidationError {
    pub detail: String,
    /// JSON Pointer to the invalid location (e.g., "/title").
    pub pointer: String,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_string(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
            instance: String::new(),
            code: String::new(),
            request_id: None,
            errors: None,
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<ValidationError>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Axum response wrapper that renders `Problem` with correct status & content type.
#[derive(Debug, Clone)]
pub struct ProblemResponse(pub Problem);

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self(p)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let mut resp = axum::Json(self.0).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}

pub fn bad_request(detail: impl Into<String>) -> ProblemResponse {
    Problem::new(StatusCode::BAD_REQUEST, "Bad Request", detail).into()
}

pub fn unauthorized(detail: impl Into<String>) -> ProblemResponse {
    Problem::new(StatusCode::UNAUTHORIZED, "Unauthorized", detail).into()
}

pub fn forbidden(detail: impl Into<String>) -> ProblemResponse {
    Problem::new(StatusCode::FORBIDDEN, "Forbidden", detail).into()
}

pub fn not_found(detail: impl Into<String>) -> ProblemResponse {
    Problem::new(StatusCode::NOT_FOUND, "Not Found", detail).into()
}

pub fn conflict(detail: impl Into<String>) -> ProblemResponse {
    Problem::new(StatusCode::CONFLICT, "Conflict", detail).into()
}

pub fn internal_error(detail: impl Into<String>) -> ProblemResponse {
    Problem::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        detail,
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_into_response_sets_status_and_content_type() {
        let p = Problem::new(StatusCode::FORBIDDEN, "Forbidden", "not a member");
        let resp = ProblemResponse(p).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let ct = resp
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        assert_eq!(ct, APPLICATION_PROBLEM_JSON);
    }

    #[test]
    fn optional_members_are_omitted_from_json() {
        let p = Problem::new(StatusCode::NOT_FOUND, "Not Found", "task missing");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "about:blank");
        assert!(json.get("code").is_none());
        assert!(json.get("instance").is_none());
        assert!(json.get("errors").is_none());

        let p = p
            .with_code("PROJECTS_TASK_NOT_FOUND")
            .with_instance("/tasks/1")
            .with_errors(vec![ValidationError {
                detail: "Title is required".to_string(),
                pointer: "/title".to_string(),
            }]);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["code"], "PROJECTS_TASK_NOT_FOUND");
        assert_eq!(json["instance"], "/tasks/1");
        assert_eq!(json["errors"][0]["pointer"], "/title");
    }

    #[test]
    fn convenience_constructors() {
        assert_eq!(bad_request("x").0.status, 400);
        assert_eq!(unauthorized("x").0.status, 401);
        assert_eq!(forbidden("x").0.status, 403);
        assert_eq!(not_found("x").0.status, 404);
        assert_eq!(conflict("x").0.status, 409);
        let internal = internal_error("x");
        assert_eq!(internal.0.status, 500);
        assert_eq!(internal.0.title, "Internal Server Error");
    }
}
