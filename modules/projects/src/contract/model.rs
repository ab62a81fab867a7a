use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Role of a user inside one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    ProjectManager,
    Member,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::ProjectManager, Role::Member];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::ProjectManager => "project_manager",
            Role::Member => "member",
        }
    }

    /// Exact match on the wire value.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == raw)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub user: Uuid,
    pub role: Role,
}

impl Membership {
    pub fn new(user: Uuid, role: Role) -> Self {
        Self { user, role }
    }
}

/// Member entry as supplied by a client; the role is still unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedMember {
    pub user: Uuid,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub owner: Uuid,
    pub members: Vec<Membership>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub members: Option<Vec<ProposedMember>>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub members: Option<Vec<ProposedMember>>,
}

/// Directory profile fields shown next to memberships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub profile_pic: String,
}

/// Membership joined with the member's profile, when the directory knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMember {
    pub membership: Membership,
    pub profile: Option<UserSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "Todo",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Accepts `InProgress` as an alias of `In Progress`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Todo" => Some(TaskStatus::Todo),
            "In Progress" | "InProgress" => Some(TaskStatus::InProgress),
            "Done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Low" => Some(TaskPriority::Low),
            "Medium" => Some(TaskPriority::Medium),
            "High" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee: Option<Uuid>,
    /// Set once at creation.
    pub created_by: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial task update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<Option<Uuid>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && !self.touches_details()
    }

    /// True when anything besides `status` is set.
    pub fn touches_details(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.priority.is_some()
            || self.assignee.is_some()
            || self.due_date.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Comment with its author's profile; `None` once the author left the directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentWithAuthor {
    pub comment: Comment,
    pub author: Option<UserSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_exact() {
        assert_eq!(Role::parse("project_manager"), Some(Role::ProjectManager));
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn status_accepts_both_in_progress_spellings() {
        assert_eq!(TaskStatus::parse("In Progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("InProgress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::InProgress.as_str(), "In Progress");
        assert_eq!(TaskStatus::parse("todo"), None);
    }

    #[test]
    fn status_only_patch_does_not_touch_details() {
        let patch = TaskPatch {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        assert!(!patch.touches_details());
        assert!(!patch.is_empty());
        assert!(TaskPatch::default().is_empty());

        let clear_assignee = TaskPatch {
            assignee: Some(None),
            ..Default::default()
        };
        assert!(clear_assignee.touches_details());
    }
}
