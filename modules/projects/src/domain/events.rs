use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Transport-agnostic domain event. `by` is the acting user.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectDomainEvent {
    ProjectCreated { id: Uuid, by: Uuid, at: DateTime<Utc> },
    ProjectUpdated { id: Uuid, by: Uuid, at: DateTime<Utc> },
    ProjectDeleted { id: Uuid, by: Uuid, at: DateTime<Utc> },
    TaskCreated { id: Uuid, project_id: Uuid, by: Uuid, at: DateTime<Utc> },
    TaskUpdated { id: Uuid, project_id: Uuid, by: Uuid, at: DateTime<Utc> },
    TaskDeleted { id: Uuid, project_id: Uuid, by: Uuid, at: DateTime<Utc> },
    CommentCreated { id: Uuid, task_id: Uuid, by: Uuid, at: DateTime<Utc> },
    CommentDeleted { id: Uuid, task_id: Uuid, by: Uuid, at: DateTime<Utc> },
}

impl ProjectDomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProjectCreated { .. } => "project.created",
            Self::ProjectUpdated { .. } => "project.updated",
            Self::ProjectDeleted { .. } => "project.deleted",
            Self::TaskCreated { .. } => "task.created",
            Self::TaskUpdated { .. } => "task.updated",
            Self::TaskDeleted { .. } => "task.deleted",
            Self::CommentCreated { .. } => "comment.created",
            Self::CommentDeleted { .. } => "comment.deleted",
        }
    }
}
