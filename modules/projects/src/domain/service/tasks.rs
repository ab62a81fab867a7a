use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{advance, storage, Service};
use crate::contract::model::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
use crate::domain::access::{
    can_change_task_status, can_create_or_update_task, can_delete_task, can_view_project,
    can_view_task,
};
use crate::domain::assignment::validate_assignee;
use crate::domain::error::DomainError;
use crate::domain::events::ProjectDomainEvent;

impl Service {
    #[instrument(
        name = "projects.service.create_task",
        skip(self, new_task),
        fields(actor = %actor, project_id = %project_id)
    )]
    pub async fn create_task(
        &self,
        actor: Uuid,
        project_id: Uuid,
        new_task: NewTask,
    ) -> Result<Task, DomainError> {
        info!("Creating task");

        let (_, set) = self.load_project(project_id).await?;
        if !can_create_or_update_task(&set, actor) {
            return Err(DomainError::forbidden(
                "Only admins and project managers can create tasks",
            ));
        }

        let title = self.clean_title(&new_task.title)?;
        let description = self.clean_description(new_task.description.as_deref())?;
        let assignee = match new_task.assignee {
            Some(candidate) => {
                Some(validate_assignee(self.directory.as_ref(), &set, candidate).await?)
            }
            None => None,
        };

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            project_id,
            title,
            description,
            status: new_task.status.unwrap_or(TaskStatus::Todo),
            priority: new_task.priority.unwrap_or(TaskPriority::Medium),
            assignee,
            created_by: actor,
            due_date: new_task.due_date,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_task(&task).await.map_err(storage)?;

        self.events.publish(&ProjectDomainEvent::TaskCreated {
            id: task.id,
            project_id,
            by: actor,
            at: now,
        });
        info!(task_id = %task.id, "Task created");
        Ok(task)
    }

    #[instrument(name = "projects.service.list_my_tasks", skip(self), fields(actor = %actor))]
    pub async fn list_my_tasks(&self, actor: Uuid) -> Result<Vec<Task>, DomainError> {
        let tasks = self.repo.list_tasks_for_user(actor).await.map_err(storage)?;
        debug!(count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    #[instrument(
        name = "projects.service.list_project_tasks",
        skip(self),
        fields(actor = %actor, project_id = %project_id)
    )]
    pub async fn list_project_tasks(
        &self,
        actor: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<Task>, DomainError> {
        let (_, set) = self.load_project(project_id).await?;
        if !can_view_project(&set, actor) {
            return Err(DomainError::forbidden("You are not a member of this project"));
        }
        self.repo
            .list_tasks_for_project(project_id)
            .await
            .map_err(storage)
    }

    #[instrument(
        name = "projects.service.get_task",
        skip(self),
        fields(actor = %actor, task_id = %id)
    )]
    pub async fn get_task(&self, actor: Uuid, id: Uuid) -> Result<Task, DomainError> {
        let task = self.load_task(id).await?;
        let (_, set) = self.load_project(task.project_id).await?;
        if !can_view_task(&set, &task, actor) {
            return Err(DomainError::forbidden("You do not have access to this task"));
        }
        Ok(task)
    }

    /// A patch that only sets `status` is also open to the creator and the
    /// assignee; anything else needs admin or project manager.
    #[instrument(
        name = "projects.service.update_task",
        skip(self, patch),
        fields(actor = %actor, task_id = %id)
    )]
    pub async fn update_task(
        &self,
        actor: Uuid,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Task, DomainError> {
        info!("Updating task");

        let mut task = self.load_task(id).await?;
        let (_, set) = self.load_project(task.project_id).await?;

        let allowed = if patch.touches_details() {
            can_create_or_update_task(&set, actor)
        } else {
            can_create_or_update_task(&set, actor) || can_change_task_status(&task, actor)
        };
        if !allowed {
            return Err(DomainError::forbidden(
                "Only admins and project managers can update tasks",
            ));
        }
        if patch.is_empty() {
            return Ok(task);
        }

        if let Some(title) = &patch.title {
            task.title = self.clean_title(title)?;
        }
        if let Some(description) = &patch.description {
            task.description = self.clean_description(Some(description))?;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        match patch.assignee {
            Some(Some(candidate)) => {
                task.assignee =
                    Some(validate_assignee(self.directory.as_ref(), &set, candidate).await?);
            }
            Some(None) => task.assignee = None,
            None => {}
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }

        self.save_task(actor, task).await
    }

    #[instrument(
        name = "projects.service.update_task_status",
        skip(self),
        fields(actor = %actor, task_id = %id, status = status.as_str())
    )]
    pub async fn update_task_status(
        &self,
        actor: Uuid,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Task, DomainError> {
        info!("Changing task status");

        let mut task = self.load_task(id).await?;
        if !can_change_task_status(&task, actor) {
            return Err(DomainError::forbidden(
                "Only the task creator or assignee can change its status",
            ));
        }
        task.status = status;
        self.save_task(actor, task).await
    }

    #[instrument(
        name = "projects.service.delete_task",
        skip(self),
        fields(actor = %actor, task_id = %id)
    )]
    pub async fn delete_task(&self, actor: Uuid, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting task");

        let task = self.load_task(id).await?;
        let (_, set) = self.load_project(task.project_id).await?;
        if !can_delete_task(&set, actor) {
            return Err(DomainError::forbidden(
                "Only project members can delete tasks",
            ));
        }

        if !self.repo.delete_task(id).await.map_err(storage)? {
            return Err(DomainError::task_not_found(id));
        }

        self.events.publish(&ProjectDomainEvent::TaskDeleted {
            id,
            project_id: task.project_id,
            by: actor,
            at: Utc::now(),
        });
        Ok(())
    }

    async fn save_task(&self, actor: Uuid, mut task: Task) -> Result<Task, DomainError> {
        task.updated_at = advance(task.updated_at);
        self.repo.update_task(&task).await.map_err(storage)?;

        self.events.publish(&ProjectDomainEvent::TaskUpdated {
            id: task.id,
            project_id: task.project_id,
            by: actor,
            at: task.updated_at,
        });
        info!("Task updated");
        Ok(task)
    }
}
