//! SeaORM-backed implementation of [`ProjectsRepository`].
//!
//! Multi-table writes (project + members, cascading deletes) run inside one
//! transaction so a reader never sees a project without its admin row.

use std::collections::HashMap;

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use super::entity::{comment, member, project, task};
use super::mapper::{
    comment_to_active, member_rows, project_from_rows, project_to_active, task_from_row,
    task_to_active,
};
use crate::contract::model::{Comment, Membership, Project, Task};
use crate::domain::repo::ProjectsRepository;

pub struct SeaOrmProjectsRepository {
    db: DatabaseConnection,
}

impl SeaOrmProjectsRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn insert_members<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    members: &[Membership],
) -> anyhow::Result<()> {
    if members.is_empty() {
        return Ok(());
    }
    member::Entity::insert_many(member_rows(project_id, members))
        .exec_without_returning(conn)
        .await
        .context("insert members failed")?;
    Ok(())
}

async fn load_members<C: ConnectionTrait>(
    conn: &C,
    project_ids: &[Uuid],
) -> anyhow::Result<HashMap<Uuid, Vec<member::Model>>> {
    let rows = member::Entity::find()
        .filter(member::Column::ProjectId.is_in(project_ids.iter().copied()))
        .order_by_asc(member::Column::Position)
        .all(conn)
        .await
        .context("load members failed")?;

    let mut by_project: HashMap<Uuid, Vec<member::Model>> = HashMap::new();
    for row in rows {
        by_project.entry(row.project_id).or_default().push(row);
    }
    Ok(by_project)
}

fn tasks_from_rows(rows: Vec<task::Model>) -> anyhow::Result<Vec<Task>> {
    rows.into_iter().map(task_from_row).collect()
}

#[async_trait::async_trait]
impl ProjectsRepository for SeaOrmProjectsRepository {
    async fn insert_project(&self, p: &Project) -> anyhow::Result<()> {
        let txn = self.db.begin().await.context("begin failed")?;
        project_to_active(p)
            .insert(&txn)
            .await
            .context("insert project failed")?;
        insert_members(&txn, p.id, &p.members).await?;
        txn.commit().await.context("commit failed")?;
        Ok(())
    }

    async fn find_project(&self, id: Uuid) -> anyhow::Result<Option<Project>> {
        let Some(row) = project::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find_project failed")?
        else {
            return Ok(None);
        };
        let mut members = load_members(&self.db, &[id]).await?;
        project_from_rows(row, members.remove(&id).unwrap_or_default()).map(Some)
    }

    async fn list_projects_for_user(&self, user: Uuid) -> anyhow::Result<Vec<Project>> {
        let ids: Vec<Uuid> = member::Entity::find()
            .select_only()
            .column(member::Column::ProjectId)
            .filter(member::Column::UserId.eq(user))
            .into_tuple()
            .all(&self.db)
            .await
            .context("list member projects failed")?;

        let rows = project::Entity::find()
            .filter(
                Condition::any()
                    .add(project::Column::Id.is_in(ids))
                    .add(project::Column::OwnerId.eq(user)),
            )
            .order_by_desc(project::Column::UpdatedAt)
            .all(&self.db)
            .await
            .context("list projects failed")?;

        let project_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut members = load_members(&self.db, &project_ids).await?;
        rows.into_iter()
            .map(|row| {
                let rows = members.remove(&row.id).unwrap_or_default();
                project_from_rows(row, rows)
            })
            .collect()
    }

    async fn update_project(&self, p: &Project) -> anyhow::Result<()> {
        let txn = self.db.begin().await.context("begin failed")?;
        project_to_active(p)
            .update(&txn)
            .await
            .context("update project failed")?;
        member::Entity::delete_many()
            .filter(member::Column::ProjectId.eq(p.id))
            .exec(&txn)
            .await
            .context("clear members failed")?;
        insert_members(&txn, p.id, &p.members).await?;
        txn.commit().await.context("commit failed")?;
        Ok(())
    }

    async fn delete_project(&self, id: Uuid) -> anyhow::Result<bool> {
        let txn = self.db.begin().await.context("begin failed")?;

        let task_ids: Vec<Uuid> = task::Entity::find()
            .select_only()
            .column(task::Column::Id)
            .filter(task::Column::ProjectId.eq(id))
            .into_tuple()
            .all(&txn)
            .await
            .context("list project tasks failed")?;
        if !task_ids.is_empty() {
            comment::Entity::delete_many()
                .filter(comment::Column::TaskId.is_in(task_ids))
                .exec(&txn)
                .await
                .context("delete comments failed")?;
        }
        task::Entity::delete_many()
            .filter(task::Column::ProjectId.eq(id))
            .exec(&txn)
            .await
            .context("delete tasks failed")?;
        member::Entity::delete_many()
            .filter(member::Column::ProjectId.eq(id))
            .exec(&txn)
            .await
            .context("delete members failed")?;
        let res = project::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete project failed")?;

        txn.commit().await.context("commit failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn insert_task(&self, t: &Task) -> anyhow::Result<()> {
        task_to_active(t)
            .insert(&self.db)
            .await
            .context("insert task failed")?;
        Ok(())
    }

    async fn find_task(&self, id: Uuid) -> anyhow::Result<Option<Task>> {
        task::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find_task failed")?
            .map(task_from_row)
            .transpose()
    }

    async fn list_tasks_for_project(&self, project_id: Uuid) -> anyhow::Result<Vec<Task>> {
        let rows = task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_id))
            .order_by_desc(task::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list project tasks failed")?;
        tasks_from_rows(rows)
    }

    async fn list_tasks_for_user(&self, user: Uuid) -> anyhow::Result<Vec<Task>> {
        let rows = task::Entity::find()
            .filter(
                Condition::any()
                    .add(task::Column::CreatedBy.eq(user))
                    .add(task::Column::AssigneeId.eq(user)),
            )
            .order_by_desc(task::Column::UpdatedAt)
            .all(&self.db)
            .await
            .context("list user tasks failed")?;
        tasks_from_rows(rows)
    }

    async fn update_task(&self, t: &Task) -> anyhow::Result<()> {
        task_to_active(t)
            .update(&self.db)
            .await
            .context("update task failed")?;
        Ok(())
    }

    async fn delete_task(&self, id: Uuid) -> anyhow::Result<bool> {
        let txn = self.db.begin().await.context("begin failed")?;
        comment::Entity::delete_many()
            .filter(comment::Column::TaskId.eq(id))
            .exec(&txn)
            .await
            .context("delete comments failed")?;
        let res = task::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete task failed")?;
        txn.commit().await.context("commit failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn insert_comment(&self, c: &Comment) -> anyhow::Result<()> {
        comment_to_active(c)
            .insert(&self.db)
            .await
            .context("insert comment failed")?;
        Ok(())
    }

    async fn find_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let found = comment::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find_comment failed")?;
        Ok(found.map(Into::into))
    }

    async fn list_comments_for_task(&self, task_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = comment::Entity::find()
            .filter(comment::Column::TaskId.eq(task_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list comments failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = comment::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete comment failed")?;
        Ok(res.rows_affected > 0)
    }
}
