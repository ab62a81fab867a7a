//! Row <-> model conversion. Enum columns use stable lowercase codes that are
//! independent of the wire spelling.

use anyhow::anyhow;
use sea_orm::Set;

use super::entity::{comment, member, project, task};
use crate::contract::model::{
    Comment, Membership, Project, Role, Task, TaskPriority, TaskStatus,
};

pub fn status_code(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "todo",
        TaskStatus::InProgress => "in_progress",
        TaskStatus::Done => "done",
    }
}

pub fn parse_status_code(code: &str) -> anyhow::Result<TaskStatus> {
    match code {
        "todo" => Ok(TaskStatus::Todo),
        "in_progress" => Ok(TaskStatus::InProgress),
        "done" => Ok(TaskStatus::Done),
        other => Err(anyhow!("unknown task status code '{other}'")),
    }
}

pub fn priority_code(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::Low => "low",
        TaskPriority::Medium => "medium",
        TaskPriority::High => "high",
    }
}

pub fn parse_priority_code(code: &str) -> anyhow::Result<TaskPriority> {
    match code {
        "low" => Ok(TaskPriority::Low),
        "medium" => Ok(TaskPriority::Medium),
        "high" => Ok(TaskPriority::High),
        other => Err(anyhow!("unknown task priority code '{other}'")),
    }
}

pub fn project_to_active(p: &Project) -> project::ActiveModel {
    project::ActiveModel {
        id: Set(p.id),
        title: Set(p.title.clone()),
        description: Set(p.description.clone()),
        owner_id: Set(p.owner),
        created_at: Set(p.created_at),
        updated_at: Set(p.updated_at),
    }
}

/// `rows` must belong to `row`'s project and be ordered by position.
pub fn project_from_rows(row: project::Model, rows: Vec<member::Model>) -> anyhow::Result<Project> {
    let members = rows
        .into_iter()
        .map(membership_from_row)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Project {
        id: row.id,
        title: row.title,
        description: row.description,
        owner: row.owner_id,
        members,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn membership_from_row(row: member::Model) -> anyhow::Result<Membership> {
    let role = Role::parse(&row.role)
        .ok_or_else(|| anyhow!("unknown role '{}' for user {}", row.role, row.user_id))?;
    Ok(Membership::new(row.user_id, role))
}

pub fn member_rows(project_id: uuid::Uuid, members: &[Membership]) -> Vec<member::ActiveModel> {
    members
        .iter()
        .zip(0i32..)
        .map(|(m, position)| member::ActiveModel {
            project_id: Set(project_id),
            user_id: Set(m.user),
            role: Set(m.role.as_str().to_owned()),
            position: Set(position),
        })
        .collect()
}

pub fn task_to_active(t: &Task) -> task::ActiveModel {
    task::ActiveModel {
        id: Set(t.id),
        project_id: Set(t.project_id),
        title: Set(t.title.clone()),
        description: Set(t.description.clone()),
        status: Set(status_code(t.status).to_owned()),
        priority: Set(priority_code(t.priority).to_owned()),
        assignee_id: Set(t.assignee),
        created_by: Set(t.created_by),
        due_date: Set(t.due_date),
        created_at: Set(t.created_at),
        updated_at: Set(t.updated_at),
    }
}

pub fn task_from_row(row: task::Model) -> anyhow::Result<Task> {
    Ok(Task {
        id: row.id,
        project_id: row.project_id,
        title: row.title,
        description: row.description,
        status: parse_status_code(&row.status)?,
        priority: parse_priority_code(&row.priority)?,
        assignee: row.assignee_id,
        created_by: row.created_by,
        due_date: row.due_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub fn comment_to_active(c: &Comment) -> comment::ActiveModel {
    comment::ActiveModel {
        id: Set(c.id),
        task_id: Set(c.task_id),
        author_id: Set(c.author),
        text: Set(c.text.clone()),
        created_at: Set(c.created_at),
    }
}

impl From<comment::Model> for Comment {
    fn from(row: comment::Model) -> Self {
        Self {
            id: row.id,
            task_id: row.task_id,
            author: row.author_id,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_stable() {
        for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done] {
            assert_eq!(parse_status_code(status_code(status)).unwrap(), status);
        }
        assert_eq!(status_code(TaskStatus::InProgress), "in_progress");
        assert!(parse_status_code("In Progress").is_err());
    }

    #[test]
    fn corrupt_role_row_is_an_error() {
        let row = member::Model {
            project_id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            role: "owner".into(),
            position: 0,
        };
        assert!(membership_from_row(row).is_err());
    }

    #[test]
    fn member_rows_keep_order() {
        let a = uuid::Uuid::new_v4();
        let b = uuid::Uuid::new_v4();
        let rows = member_rows(
            uuid::Uuid::new_v4(),
            &[Membership::new(a, Role::Admin), Membership::new(b, Role::Member)],
        );
        assert_eq!(rows[1].position, Set(1));
        assert_eq!(rows[1].role, Set("member".to_owned()));
    }
}
