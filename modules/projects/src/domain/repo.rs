use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{Comment, Project, Task};

/// Persistence port for projects, tasks and comments.
///
/// A project is always stored and loaded together with its memberships; the
/// implementation replaces the whole member list atomically on update.
#[async_trait]
pub trait ProjectsRepository: Send + Sync {
    async fn insert_project(&self, project: &Project) -> anyhow::Result<()>;
    async fn find_project(&self, id: Uuid) -> anyhow::Result<Option<Project>>;
    /// Projects the user owns or belongs to, most recently updated first.
    async fn list_projects_for_user(&self, user: Uuid) -> anyhow::Result<Vec<Project>>;
    async fn update_project(&self, project: &Project) -> anyhow::Result<()>;
    /// Removes the project with its memberships, tasks and their comments.
    async fn delete_project(&self, id: Uuid) -> anyhow::Result<bool>;

    async fn insert_task(&self, task: &Task) -> anyhow::Result<()>;
    async fn find_task(&self, id: Uuid) -> anyhow::Result<Option<Task>>;
    async fn list_tasks_for_project(&self, project_id: Uuid) -> anyhow::Result<Vec<Task>>;
    /// Tasks created by or assigned to the user, newest first.
    async fn list_tasks_for_user(&self, user: Uuid) -> anyhow::Result<Vec<Task>>;
    async fn update_task(&self, task: &Task) -> anyhow::Result<()>;
    /// Removes the task and its comments.
    async fn delete_task(&self, id: Uuid) -> anyhow::Result<bool>;

    async fn insert_comment(&self, comment: &Comment) -> anyhow::Result<()>;
    async fn find_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    /// Oldest first.
    async fn list_comments_for_task(&self, task_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool>;
}
