use async_trait::async_trait;
use axum::Router;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;

pub use crate::api::OpenApiRegistry;

/// Core module: DI/wiring; do not rely on migrated schema here.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    async fn init(&self, ctx: &crate::context::ModuleCtx) -> anyhow::Result<()>;
    fn as_any(&self) -> &dyn std::any::Any;
}

#[async_trait]
pub trait DbModule: Send + Sync {
    /// Runs AFTER init, BEFORE REST/start.
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()>;
}

/// Pure wiring; must be sync. Runs AFTER DB migrations.
pub trait RestfulModule: Send + Sync {
    fn register_rest(
        &self,
        ctx: &crate::context::ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<Router>;
}

/// REST host module: owns the HTTP server. `rest_prepare` runs before any
/// module registers routes, `rest_finalize` after all of them. Neither starts
/// the server.
pub trait RestHostModule: Send + Sync + 'static {
    fn rest_prepare(
        &self,
        ctx: &crate::context::ModuleCtx,
        router: Router,
    ) -> anyhow::Result<Router>;

    /// Attach host routes and global middleware, keep the Router for serving.
    fn rest_finalize(
        &self,
        ctx: &crate::context::ModuleCtx,
        router: Router,
    ) -> anyhow::Result<Router>;

    /// Registry that collects the OpenAPI documents of REST modules.
    fn as_registry(&self) -> &dyn OpenApiRegistry;
}

#[async_trait]
pub trait StatefulModule: Send + Sync {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()>;
    async fn stop(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}
