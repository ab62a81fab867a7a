//! HTTP host of the taskboard server.
//!
//! `ApiIngress` is the single REST host: modules register their routes and
//! OpenAPI documents against it during the REST phase; `rest_finalize` puts the
//! bearer-token layer in front of those routes, adds the public endpoints and
//! the global middleware stack, and keeps the router for `start`.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{routing::get, Router};
use modkit::{OpenApiRegistry, SecurityCtx};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use utoipa::openapi::{
    security::{Http, HttpAuthScheme, SecurityScheme},
    Components, InfoBuilder, OpenApi, OpenApiBuilder,
};

pub mod auth;
mod config;
pub mod request_id;
mod web;

pub use auth::{AccessClaims, AuthError, Authenticator};
pub use config::{ApiIngressConfig, AuthConfig};

pub const MODULE_NAME: &str = "api_ingress";

const STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the HTTP server (rest_host + stateful).
pub struct ApiIngress {
    config: RwLock<ApiIngressConfig>,
    // (module, document) in registration order
    docs: Mutex<Vec<(String, OpenApi)>>,
    final_router: Mutex<Option<Router>>,
    server: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config: RwLock::new(config),
            docs: Mutex::new(Vec::new()),
            final_router: Mutex::new(None),
            server: Mutex::new(None),
        }
    }

    pub fn get_config(&self) -> ApiIngressConfig {
        self.config.read().clone()
    }

    /// Merge every registered module document into one.
    pub fn build_openapi(&self) -> OpenApi {
        let mut doc = OpenApiBuilder::new()
            .info(
                InfoBuilder::new()
                    .title("Taskboard API")
                    .version(env!("CARGO_PKG_VERSION"))
                    .description(Some("Projects, tasks and comments with role-based access"))
                    .build(),
            )
            .build();

        for (module, module_doc) in self.docs.lock().iter() {
            tracing::debug!(module = %module, "Merging OpenAPI document");
            doc.merge(module_doc.clone());
        }

        doc.components
            .get_or_insert_with(Components::new)
            .add_security_scheme("bearerAuth", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
        doc
    }

    /// Router kept by `rest_finalize`; `None` before the REST phase ran.
    pub fn finalized_router(&self) -> Option<Router> {
        self.final_router.lock().clone()
    }

    /// Global layers. Last added runs first:
    /// PropagateRequestId -> SetRequestId -> Trace -> push_req_id -> Timeout -> CORS -> BodyLimit
    fn apply_middleware(router: Router, cfg: &ApiIngressConfig) -> Router {
        let mut router = router.layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));

        if cfg.cors_enabled {
            router = router.layer(Self::cors_layer(&cfg.allowed_origins));
        }

        let x_request_id = request_id::header();
        router
            .layer(TimeoutLayer::new(Duration::from_secs(cfg.request_timeout_sec.max(1))))
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer())
            .layer(SetRequestIdLayer::new(x_request_id.clone(), request_id::MakeReqId))
            .layer(PropagateRequestIdLayer::new(x_request_id))
    }

    fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
        if allowed_origins.is_empty() {
            return CorsLayer::permissive();
        }
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Lets clients check whether their token is accepted.
async fn session(ctx: SecurityCtx) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "userId": ctx.subject }))
}

#[async_trait]
impl modkit::Module for ApiIngress {
    async fn init(&self, ctx: &modkit::ModuleCtx) -> Result<()> {
        let cfg = ctx.module_config::<ApiIngressConfig>();
        if cfg.auth.jwt_secret.trim().is_empty() {
            anyhow::bail!("modules.{MODULE_NAME}.auth.jwt_secret must be set");
        }
        cfg.bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid bind address '{}'", cfg.bind_addr))?;
        tracing::debug!(bind_addr = %cfg.bind_addr, cors = cfg.cors_enabled, "api_ingress configured");
        *self.config.write() = cfg;
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl modkit::RestHostModule for ApiIngress {
    fn rest_prepare(&self, _ctx: &modkit::ModuleCtx, router: Router) -> Result<Router> {
        Ok(router.route("/auth/session", get(session)))
    }

    fn rest_finalize(&self, _ctx: &modkit::ModuleCtx, router: Router) -> Result<Router> {
        let cfg = self.get_config();

        // Only routes registered so far require a token.
        let authenticator = Authenticator::new(&cfg.auth);
        let router = router.route_layer(from_fn_with_state(authenticator, auth::authenticate));

        let doc = Arc::new(serde_json::to_value(self.build_openapi())?);
        let router = router
            .route("/health", get(web::health_check))
            .route("/openapi.json", get(move || web::openapi_json(doc.clone())));

        let router = Self::apply_middleware(router, &cfg);
        *self.final_router.lock() = Some(router.clone());
        tracing::debug!("REST host finalized router");
        Ok(router)
    }

    fn as_registry(&self) -> &dyn OpenApiRegistry {
        self
    }
}

impl OpenApiRegistry for ApiIngress {
    fn register_doc(&self, module: &str, doc: OpenApi) {
        let mut docs = self.docs.lock();
        if docs.iter().any(|(m, _)| m == module) {
            tracing::error!(module, "Duplicate OpenAPI registration ignored");
            return;
        }
        tracing::debug!(module, paths = doc.paths.paths.len(), "Registered OpenAPI document");
        docs.push((module.to_string(), doc));
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl modkit::StatefulModule for ApiIngress {
    /// Bind and serve in the background until `cancel` fires.
    async fn start(&self, cancel: CancellationToken) -> Result<()> {
        let router = self
            .finalized_router()
            .context("REST phase did not produce a router")?;
        let addr: SocketAddr = self.get_config().bind_addr.parse()?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!("HTTP server bound on {}", listener.local_addr()?);

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel.cancelled().await;
                    tracing::info!("HTTP server shutting down gracefully");
                })
                .await
                .map_err(anyhow::Error::from)
        });
        *self.server.lock() = Some(handle);
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<()> {
        let Some(handle) = self.server.lock().take() else {
            return Ok(());
        };
        match tokio::time::timeout(STOP_TIMEOUT, handle).await {
            Ok(joined) => joined?,
            Err(_) => anyhow::bail!("HTTP server did not stop within {STOP_TIMEOUT:?}"),
        }
    }
}
