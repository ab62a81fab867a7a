use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{User, UserProfile};

/// Public API of the directory module for other modules.
/// Errors carry a [`crate::DirectoryError`] that callers may downcast.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// One query for all ids; unknown ids are omitted, duplicates collapsed.
    async fn find_many_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<User>>;

    async fn exists_by_id(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Case-insensitive substring match on email.
    async fn search_by_email(&self, keyword: &str) -> anyhow::Result<Vec<User>>;

    async fn upsert_profile(&self, id: Uuid, profile: UserProfile) -> anyhow::Result<User>;
}
