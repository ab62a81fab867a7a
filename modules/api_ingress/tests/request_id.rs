//! `x-request-id` through the finalized host router: generated when absent,
//! echoed when sent, visible to handlers and present on auth problems.

use std::sync::Arc;

use anyhow::Result;
use api_ingress::request_id::XRequestId;
use api_ingress::{ApiIngress, MODULE_NAME};
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use modkit::{ModuleCtx, ModuleCtxBuilder, ModuleEntry, ModuleRegistry, OpenApiRegistry, RestfulModule};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing_test::traced_test;

struct Board;

#[async_trait]
impl modkit::Module for Board {
    async fn init(&self, _ctx: &ModuleCtx) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl RestfulModule for Board {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: Router,
        _openapi: &dyn OpenApiRegistry,
    ) -> Result<Router> {
        Ok(router.route("/board", get(|| async { "ok" })))
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
    let board = Arc::new(Board);
    let registry = ModuleRegistry::builder()
        .module(ModuleEntry::new("board", board.clone()).rest(board))
        .module(
            ModuleEntry::new(MODULE_NAME, ingress.clone())
                .rest_host(ingress.clone())
                .stateful(ingress),
        )
        .build()
        .unwrap();

    let cfg = StaticConfig(json!({ "api_ingress": { "auth": { "jwt_secret": "rid-secret" } } }));
    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_config_provider(Arc::new(cfg))
        .build();
    registry.run_init_phase(&ctx).await.unwrap();
    registry.run_rest_phase(&ctx, Router::new()).unwrap()
}

fn request_id(resp: &axum::response::Response) -> Option<String> {
    resp.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

#[tokio::test]
async fn generates_request_id_when_missing() {
    let resp = host_router()
        .await
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let rid = request_id(&resp).expect("x-request-id should be generated");
    assert_eq!(rid.len(), 21, "nanoid default length");
}

#[tokio::test]
async fn preserves_incoming_request_id_on_auth_failure() {
    let resp = host_router()
        .await
        .oneshot(
            Request::builder()
                .uri("/board")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(request_id(&resp).as_deref(), Some("abc-123"));
}

#[tokio::test]
async fn handlers_see_the_request_id_extension() {
    let router = Router::new()
        .route(
            "/echo",
            get(|Extension(XRequestId(rid)): Extension<XRequestId>| async move { rid }),
        )
        .layer(axum::middleware::from_fn(
            api_ingress::request_id::push_req_id_to_extensions,
        ));

    let resp = router
        .oneshot(
            Request::builder()
                .uri("/echo")
                .header("x-request-id", "from-client")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"from-client");
}

#[tokio::test]
#[traced_test]
async fn request_span_carries_the_id() {
    host_router()
        .await
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "span-check-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(logs_contain("http_request"));
    assert!(logs_contain("span-check-42"));
}
