use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{storage, Service};
use crate::contract::model::{Comment, CommentWithAuthor, UserSummary};
use crate::domain::access::{can_access_comment, can_delete_comment};
use crate::domain::error::DomainError;
use crate::domain::events::ProjectDomainEvent;

impl Service {
    #[instrument(
        name = "projects.service.create_comment",
        skip(self, text),
        fields(actor = %actor, task_id = %task_id)
    )]
    pub async fn create_comment(
        &self,
        actor: Uuid,
        task_id: Uuid,
        text: &str,
    ) -> Result<CommentWithAuthor, DomainError> {
        let task = self.load_task(task_id).await?;
        if !can_access_comment(&task, actor) {
            return Err(DomainError::forbidden(
                "Only the task creator or assignee can comment on this task",
            ));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            task_id,
            author: actor,
            text: self.clean_comment(text)?,
            created_at: Utc::now(),
        };
        let author = self.directory.find_by_id(actor).await.map_err(storage)?;
        self.repo.insert_comment(&comment).await.map_err(storage)?;

        self.events.publish(&ProjectDomainEvent::CommentCreated {
            id: comment.id,
            task_id,
            by: actor,
            at: comment.created_at,
        });
        info!(comment_id = %comment.id, "Comment created");
        Ok(CommentWithAuthor { comment, author })
    }

    #[instrument(
        name = "projects.service.list_comments",
        skip(self),
        fields(actor = %actor, task_id = %task_id)
    )]
    pub async fn list_comments(
        &self,
        actor: Uuid,
        task_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, DomainError> {
        let task = self.load_task(task_id).await?;
        if !can_access_comment(&task, actor) {
            return Err(DomainError::forbidden(
                "Only the task creator or assignee can read its comments",
            ));
        }
        let comments = self
            .repo
            .list_comments_for_task(task_id)
            .await
            .map_err(storage)?;

        let mut author_ids: Vec<Uuid> = comments.iter().map(|c| c.author).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let profiles: HashMap<Uuid, UserSummary> = self
            .directory
            .find_many_by_ids(&author_ids)
            .await
            .map_err(storage)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(comments
            .into_iter()
            .map(|comment| CommentWithAuthor {
                author: profiles.get(&comment.author).cloned(),
                comment,
            })
            .collect())
    }

    #[instrument(
        name = "projects.service.delete_comment",
        skip(self),
        fields(actor = %actor, comment_id = %id)
    )]
    pub async fn delete_comment(&self, actor: Uuid, id: Uuid) -> Result<(), DomainError> {
        let comment = self
            .repo
            .find_comment(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::comment_not_found(id))?;
        let task = self.load_task(comment.task_id).await?;
        if !can_delete_comment(&comment, &task, actor) {
            return Err(DomainError::forbidden(
                "Only the author, the task creator or the assignee can delete this comment",
            ));
        }

        if !self.repo.delete_comment(id).await.map_err(storage)? {
            return Err(DomainError::comment_not_found(id));
        }

        self.events.publish(&ProjectDomainEvent::CommentDeleted {
            id,
            task_id: comment.task_id,
            by: actor,
            at: Utc::now(),
        });
        info!("Comment deleted");
        Ok(())
    }
}
