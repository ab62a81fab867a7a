use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::UserSummary;

/// User lookups the domain needs. Users are referenced by id only.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserSummary>>;

    /// Single batched lookup; unknown ids are simply absent from the result.
    async fn find_many_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<UserSummary>>;

    async fn exists_by_id(&self, id: Uuid) -> anyhow::Result<bool>;
}
