use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::DirectoryApi,
    error::DirectoryError,
    model::{User, UserProfile},
};
use crate::domain::{error::DomainError, service::Service};

/// In-process [`DirectoryApi`] backed by the domain service.
pub struct DirectoryLocalClient {
    service: Arc<Service>,
}

impl DirectoryLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl DirectoryApi for DirectoryLocalClient {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.service.find_user(id).await.map_err(to_anyhow)
    }

    async fn find_many_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<User>> {
        self.service.find_many(ids).await.map_err(to_anyhow)
    }

    async fn exists_by_id(&self, id: Uuid) -> anyhow::Result<bool> {
        self.service.exists(id).await.map_err(to_anyhow)
    }

    async fn search_by_email(&self, keyword: &str) -> anyhow::Result<Vec<User>> {
        self.service.search_by_email(keyword).await.map_err(to_anyhow)
    }

    async fn upsert_profile(&self, id: Uuid, profile: UserProfile) -> anyhow::Result<User> {
        self.service
            .upsert_profile(id, profile)
            .await
            .map_err(to_anyhow)
    }
}

fn to_anyhow(e: DomainError) -> anyhow::Error {
    anyhow::Error::new(map_domain_error(e))
}

/// Domain errors never cross the module boundary as-is.
fn map_domain_error(e: DomainError) -> DirectoryError {
    match e {
        DomainError::UserNotFound { id } => DirectoryError::not_found(id),
        DomainError::EmailAlreadyExists { email } => DirectoryError::conflict(email),
        DomainError::InvalidEmail { email } => {
            DirectoryError::validation(format!("invalid email: {email}"))
        }
        e @ (DomainError::EmptyFullName | DomainError::FullNameTooLong { .. }) => {
            DirectoryError::validation(e.to_string())
        }
        DomainError::Validation { field, message } => {
            DirectoryError::validation(format!("{field}: {message}"))
        }
        DomainError::Database { message } => {
            tracing::error!(%message, "directory storage failure");
            DirectoryError::Internal
        }
    }
}
