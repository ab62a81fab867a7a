use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{
    CommentWithAuthor, NewProject, NewTask, Project, ProjectMember, ProjectPatch, ProposedMember, Task,
    TaskPatch, TaskPriority, TaskStatus,
};
use crate::domain::error::DomainError;

/// `{user, role}` pair. Role is one of `admin`, `project_manager`, `member`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberDto {
    pub user: Uuid,
    #[schema(example = "member")]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub owner: Uuid,
    pub members: Vec<MemberDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectReq {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Admin entries are ignored; the creator is always the admin.
    #[serde(default)]
    pub members: Option<Vec<MemberDto>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectReq {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Replaces the whole member list except the admin.
    #[serde(default)]
    pub members: Option<Vec<MemberDto>>,
}

/// Membership with the member's directory profile, if one exists.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMemberDto {
    pub user: Uuid,
    pub role: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub profile_pic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    #[schema(example = "In Progress")]
    pub status: String,
    #[schema(example = "Medium")]
    pub priority: String,
    pub assignee: Option<Uuid>,
    pub created_by: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskReq {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub assignee: Option<Uuid>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update. `null` clears `assignee` / `dueDate`; an absent field is left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskReq {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<Uuid>)]
    pub assignee: Option<Option<Uuid>>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    #[schema(example = "Done")]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCommentReq {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author_id: Uuid,
    /// Absent when the author no longer has a directory profile.
    pub author: Option<CommentAuthorDto>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthorDto {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub profile_pic: String,
}

/// Field present (value or `null`) maps to `Some(..)`; `#[serde(default)]` covers absence.
fn present_or_null<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

pub fn parse_status(raw: &str) -> Result<TaskStatus, DomainError> {
    TaskStatus::parse(raw.trim()).ok_or_else(|| {
        DomainError::validation("status", format!("'{raw}' is not one of Todo, In Progress, Done"))
    })
}

fn parse_priority(raw: &str) -> Result<TaskPriority, DomainError> {
    TaskPriority::parse(raw.trim()).ok_or_else(|| {
        DomainError::validation("priority", format!("'{raw}' is not one of Low, Medium, High"))
    })
}

fn proposed(members: Option<Vec<MemberDto>>) -> Option<Vec<ProposedMember>> {
    members.map(|list| {
        list.into_iter()
            .map(|m| ProposedMember {
                user: m.user,
                role: m.role,
            })
            .collect()
    })
}

impl From<Project> for ProjectDto {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            owner: p.owner,
            members: p
                .members
                .into_iter()
                .map(|m| MemberDto {
                    user: m.user,
                    role: m.role.as_str().to_owned(),
                })
                .collect(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<CreateProjectReq> for NewProject {
    fn from(req: CreateProjectReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            members: proposed(req.members),
        }
    }
}

impl From<UpdateProjectReq> for ProjectPatch {
    fn from(req: UpdateProjectReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            members: proposed(req.members),
        }
    }
}

impl From<ProjectMember> for ProjectMemberDto {
    fn from(m: ProjectMember) -> Self {
        let (email, full_name, profile_pic) = match m.profile {
            Some(p) => (Some(p.email), Some(p.full_name), Some(p.profile_pic)),
            None => (None, None, None),
        };
        Self {
            user: m.membership.user,
            role: m.membership.role.as_str().to_owned(),
            email,
            full_name,
            profile_pic,
        }
    }
}

impl From<Task> for TaskDto {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            project_id: t.project_id,
            title: t.title,
            description: t.description,
            status: t.status.as_str().to_owned(),
            priority: t.priority.as_str().to_owned(),
            assignee: t.assignee,
            created_by: t.created_by,
            due_date: t.due_date,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

impl TryFrom<CreateTaskReq> for NewTask {
    type Error = DomainError;

    fn try_from(req: CreateTaskReq) -> Result<Self, Self::Error> {
        Ok(Self {
            title: req.title,
            description: req.description,
            status: req.status.as_deref().map(parse_status).transpose()?,
            priority: req.priority.as_deref().map(parse_priority).transpose()?,
            assignee: req.assignee,
            due_date: req.due_date,
        })
    }
}

impl TryFrom<UpdateTaskReq> for TaskPatch {
    type Error = DomainError;

    fn try_from(req: UpdateTaskReq) -> Result<Self, Self::Error> {
        Ok(Self {
            title: req.title,
            description: req.description,
            status: req.status.as_deref().map(parse_status).transpose()?,
            priority: req.priority.as_deref().map(parse_priority).transpose()?,
            assignee: req.assignee,
            due_date: req.due_date,
        })
    }
}

impl From<CommentWithAuthor> for CommentDto {
    fn from(CommentWithAuthor { comment, author }: CommentWithAuthor) -> Self {
        Self {
            id: comment.id,
            task_id: comment.task_id,
            author_id: comment.author,
            author: author.map(|u| CommentAuthorDto {
                id: u.id,
                full_name: u.full_name,
                email: u.email,
                profile_pic: u.profile_pic,
            }),
            text: comment.text,
            created_at: comment.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_task_distinguishes_null_from_absent() {
        let absent: UpdateTaskReq = serde_json::from_value(json!({ "title": "x" })).unwrap();
        assert_eq!(absent.assignee, None);

        let cleared: UpdateTaskReq = serde_json::from_value(json!({ "assignee": null })).unwrap();
        assert_eq!(cleared.assignee, Some(None));

        let id = Uuid::new_v4();
        let set: UpdateTaskReq = serde_json::from_value(json!({ "assignee": id })).unwrap();
        assert_eq!(set.assignee, Some(Some(id)));
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let req = UpdateTaskReq {
            status: Some("Blocked".into()),
            ..Default::default()
        };
        let err = TaskPatch::try_from(req).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "status"));
    }

    #[test]
    fn task_dto_uses_wire_spelling() {
        let now = Utc::now();
        let dto = TaskDto::from(Task {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "t".into(),
            description: String::new(),
            status: TaskStatus::InProgress,
            priority: TaskPriority::High,
            assignee: None,
            created_by: Uuid::new_v4(),
            due_date: None,
            created_at: now,
            updated_at: now,
        });
        let v = serde_json::to_value(dto).unwrap();
        assert_eq!(v["status"], "In Progress");
        assert_eq!(v["priority"], "High");
        assert!(v.get("createdBy").is_some());
    }
}
