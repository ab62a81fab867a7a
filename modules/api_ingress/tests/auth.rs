//! End-to-end checks of the host router: a module registers a protected route,
//! the REST phase runs, and requests go through the real middleware stack.

use std::sync::Arc;

use anyhow::Result;
use api_ingress::{ApiIngress, MODULE_NAME};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use modkit::{
    ModuleCtx, ModuleCtxBuilder, ModuleEntry, ModuleRegistry, OpenApiRegistry, RestfulModule,
    SecurityCtx,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing_test::traced_test;
use uuid::Uuid;

const SECRET: &str = "integration-secret";

struct EchoModule;

#[async_trait]
impl modkit::Module for EchoModule {
    async fn init(&self, _ctx: &ModuleCtx) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

async fn whoami(ctx: SecurityCtx) -> Json<Value> {
    Json(json!({ "subject": ctx.subject }))
}

impl RestfulModule for EchoModule {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> Result<Router> {
        openapi.register_doc("echo", utoipa::openapi::OpenApiBuilder::new().build());
        Ok(router.route("/echo/me", get(whoami)))
    }
}

struct StaticConfig(Value);

impl modkit::ConfigProvider for StaticConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&Value> {
        self.0.get(module_name)
    }
}

async fn host_router() -> Router {
    let ingress = Arc::new(ApiIngress::default());
    let echo = Arc::new(EchoModule);
    let registry = ModuleRegistry::builder()
        .module(ModuleEntry::new("echo", echo.clone()).rest(echo))
        .module(
            ModuleEntry::new(MODULE_NAME, ingress.clone())
                .rest_host(ingress.clone())
                .stateful(ingress),
        )
        .build()
        .unwrap();

    let cfg = StaticConfig(json!({
        "api_ingress": {
            "bind_addr": "127.0.0.1:0",
            "auth": { "jwt_secret": SECRET }
        }
    }));
    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_config_provider(Arc::new(cfg))
        .build();

    registry.run_init_phase(&ctx).await.unwrap();
    registry.run_rest_phase(&ctx, Router::new()).unwrap()
}

fn token(subject: Uuid, secret: &str, exp_offset_secs: i64) -> String {
    let claims = json!({
        "id": subject,
        "email": "someone@example.com",
        "exp": chrono::Utc::now().timestamp() + exp_offset_secs,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

async fn get_with(router: Router, uri: &str, header: Option<(&str, String)>) -> (StatusCode, Value) {
    let mut req = Request::builder().uri(uri);
    if let Some((name, value)) = header {
        req = req.header(name, value);
    }
    let resp = router.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = get_with(host_router().await, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn openapi_document_is_public_and_merged() {
    let (status, body) = get_with(host_router().await, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Taskboard API");
}

#[tokio::test]
async fn missing_token_is_401() {
    let (status, body) = get_with(host_router().await, "/echo/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Token is missing");
}

#[tokio::test]
async fn bearer_token_sets_security_context() {
    let user = Uuid::new_v4();
    let (status, body) = get_with(
        host_router().await,
        "/echo/me",
        Some(("authorization", format!("Bearer {}", token(user, SECRET, 3600)))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], user.to_string());
}

#[tokio::test]
async fn cookie_token_is_accepted() {
    let user = Uuid::new_v4();
    let (status, body) = get_with(
        host_router().await,
        "/auth/session",
        Some(("cookie", format!("tokens={}", token(user, SECRET, 3600)))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user.to_string());
}

#[tokio::test]
async fn expired_token_is_401() {
    let (status, body) = get_with(
        host_router().await,
        "/echo/me",
        Some(("authorization", format!("Bearer {}", token(Uuid::new_v4(), SECRET, -3600)))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Token has expired");
}

#[tokio::test]
#[traced_test]
async fn wrongly_signed_token_is_403_and_logged() {
    let (status, body) = get_with(
        host_router().await,
        "/echo/me",
        Some(("authorization", format!("Bearer {}", token(Uuid::new_v4(), "other", 3600)))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Invalid token");
    assert!(logs_contain("token rejected"));
}

#[tokio::test]
async fn unknown_route_is_404_not_401() {
    let (status, _) = get_with(host_router().await, "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn init_rejects_missing_secret() {
    let ingress = ApiIngress::default();
    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_config_provider(Arc::new(StaticConfig(json!({}))))
        .build()
        .for_module(MODULE_NAME);
    let err = modkit::Module::init(&ingress, &ctx).await.unwrap_err();
    assert!(err.to_string().contains("jwt_secret"));
}
