//! [`UserDirectory`] port backed by the directory module's client from the hub.

use std::sync::Arc;

use async_trait::async_trait;
use directory::{DirectoryApi, User};
use uuid::Uuid;

use crate::contract::model::UserSummary;
use crate::domain::ports::UserDirectory;

pub struct DirectoryAdapter {
    api: Arc<dyn DirectoryApi>,
}

impl DirectoryAdapter {
    pub fn new(api: Arc<dyn DirectoryApi>) -> Self {
        Self { api }
    }
}

fn summary(user: User) -> UserSummary {
    UserSummary {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        profile_pic: user.profile_pic,
    }
}

#[async_trait]
impl UserDirectory for DirectoryAdapter {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserSummary>> {
        Ok(self.api.find_by_id(id).await?.map(summary))
    }

    async fn find_many_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<UserSummary>> {
        Ok(self
            .api
            .find_many_by_ids(ids)
            .await?
            .into_iter()
            .map(summary)
            .collect())
    }

    async fn exists_by_id(&self, id: Uuid) -> anyhow::Result<bool> {
        self.api.exists_by_id(id).await
    }
}
