use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use modkit::{DbModule, Module, ModuleCtx, OpenApiRegistry, RestfulModule};
use parking_lot::RwLock;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::DirectoryConfig;
use crate::contract::client::DirectoryApi;
use crate::domain::service::Service;
use crate::gateways::local::DirectoryLocalClient;
use crate::infra::storage::migrations::Migrator;

/// Directory module: owns the `users` table and publishes [`DirectoryApi`].
#[derive(Default)]
pub struct Directory {
    service: RwLock<Option<Arc<Service>>>,
}

impl Directory {
    fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .read()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("directory service is not initialized"))
    }
}

#[async_trait]
impl Module for Directory {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        let db = ctx.db_required()?;
        let cfg: DirectoryConfig = ctx.module_config();
        info!(
            max_search_results = cfg.max_search_results,
            "Initializing directory module"
        );

        let service = Arc::new(Service::new(db, cfg.into()));
        *self.service.write() = Some(service.clone());

        let api: Arc<dyn DirectoryApi> = Arc::new(DirectoryLocalClient::new(service));
        ctx.client_hub().register::<dyn DirectoryApi>(api);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for Directory {
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running directory migrations");
        Migrator::up(db, None).await?;
        Ok(())
    }
}

impl RestfulModule for Directory {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<Router> {
        crate::api::rest::routes::register_routes(router, openapi, self.service()?)
    }
}
