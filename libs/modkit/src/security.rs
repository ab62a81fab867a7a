use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::api::problem::{unauthorized, ProblemResponse};

/// Identity of the caller, established by the REST host after verifying the
/// bearer token. Handlers take it as an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityCtx {
    pub subject: Uuid,
}

impl SecurityCtx {
    pub fn new(subject: Uuid) -> Self {
        Self { subject }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SecurityCtx {
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityCtx>()
            .copied()
            .ok_or_else(|| unauthorized("Token is missing").0.with_instance(parts.uri.path()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    async fn whoami(ctx: SecurityCtx) -> String {
        ctx.subject.to_string()
    }

    #[tokio::test]
    async fn extractor_reads_subject_from_extensions() {
        let subject = Uuid::new_v4();
        let app = Router::new().route("/me", get(whoami));

        let mut req = Request::builder().uri("/me").body(Body::empty()).unwrap();
        req.extensions_mut().insert(SecurityCtx::new(subject));
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, subject.to_string().as_bytes());
    }

    #[tokio::test]
    async fn missing_context_is_rejected_with_401_problem() {
        let app = Router::new().route("/me", get(whoami));
        let req = Request::builder().uri("/me").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers()["content-type"],
            crate::api::problem::APPLICATION_PROBLEM_JSON
        );
    }
}
