use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use directory::DirectoryApi;
use modkit::{DbModule, Module, ModuleCtx, OpenApiRegistry, RestfulModule};
use parking_lot::RwLock;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::ProjectsConfig;
use crate::domain::service::Service;
use crate::infra::directory::DirectoryAdapter;
use crate::infra::events::TracingEventPublisher;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::SeaOrmProjectsRepository;

/// Projects module: projects, memberships, tasks and comments.
/// Needs the directory client in the hub, so it must init after `directory`.
#[derive(Default)]
pub struct Projects {
    service: RwLock<Option<Arc<Service>>>,
}

#[async_trait]
impl Module for Projects {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing projects module");

        let cfg: ProjectsConfig = ctx.module_config();
        debug!(
            max_title_length = cfg.max_title_length,
            max_comment_length = cfg.max_comment_length,
            "Loaded projects config"
        );

        let db = ctx.db_required()?;
        let directory_api = ctx.client_hub().get::<dyn DirectoryApi>()?;

        let service = Service::new(
            Arc::new(SeaOrmProjectsRepository::new(db)),
            Arc::new(DirectoryAdapter::new(directory_api)),
            Arc::new(TracingEventPublisher),
            cfg.into(),
        );
        *self.service.write() = Some(Arc::new(service));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for Projects {
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running projects database migrations");
        Migrator::up(db, None).await?;
        Ok(())
    }
}

impl RestfulModule for Projects {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<Router> {
        info!("Registering projects REST routes");
        let service = self
            .service
            .read()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))?;
        routes::register_routes(router, openapi, service)
    }
}
