#![allow(dead_code)]

use std::sync::Arc;

use directory::{
    contract::{client::DirectoryApi, model::UserProfile},
    domain::service::Service as DirectoryService,
    gateways::local::DirectoryLocalClient,
};
use projects::domain::service::{Service, ServiceConfig};
use projects::infra::{
    directory::DirectoryAdapter, events::TracingEventPublisher,
    storage::sea_orm_repo::SeaOrmProjectsRepository,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

/// In-memory SQLite with both modules' schemas. One pooled connection, so every
/// query and transaction sees the same database.
pub async fn migrated_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("Failed to connect to test database");
    directory::infra::storage::migrations::Migrator::up(&db, None)
        .await
        .expect("directory migrations");
    projects::infra::storage::migrations::Migrator::up(&db, None)
        .await
        .expect("projects migrations");
    db
}

pub struct Harness {
    pub service: Arc<Service>,
    pub directory: Arc<dyn DirectoryApi>,
    pub db: DatabaseConnection,
}

impl Harness {
    pub async fn new() -> Self {
        let db = migrated_db().await;
        let directory: Arc<dyn DirectoryApi> = Arc::new(DirectoryLocalClient::new(Arc::new(
            DirectoryService::new(db.clone(), Default::default()),
        )));
        let service = Service::new(
            Arc::new(SeaOrmProjectsRepository::new(db.clone())),
            Arc::new(DirectoryAdapter::new(directory.clone())),
            Arc::new(TracingEventPublisher),
            ServiceConfig::default(),
        );
        Self {
            service: Arc::new(service),
            directory,
            db,
        }
    }

    /// Register a user in the directory and return its id.
    pub async fn user(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.directory
            .upsert_profile(
                id,
                UserProfile {
                    email: format!("{name}.{}@example.com", id.simple()),
                    full_name: name.to_string(),
                    profile_pic: None,
                },
            )
            .await
            .expect("seed user");
        id
    }
}
