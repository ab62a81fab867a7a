//! Authorization predicates.
//!
//! Every access decision in the service goes through exactly one of these
//! functions. Project-level rules look at the membership set; task-level and
//! comment-level rules look at the task's creator and assignee only.

use uuid::Uuid;

use crate::contract::model::{Comment, Role, Task};
use crate::domain::membership::MembershipSet;

/// Update a project (title, description, members). Admin only.
pub fn can_mutate_project(set: &MembershipSet, user: Uuid) -> bool {
    set.role_of(user) == Some(Role::Admin)
}

/// Delete a project: admin and owner. Both checks are kept even though the
/// admin is always the owner.
pub fn can_delete_project(set: &MembershipSet, owner: Uuid, user: Uuid) -> bool {
    can_mutate_project(set, user) && user == owner
}

/// Read a project, its members and its task list.
pub fn can_view_project(set: &MembershipSet, user: Uuid) -> bool {
    set.role_of(user).is_some()
}

pub fn can_create_or_update_task(set: &MembershipSet, user: Uuid) -> bool {
    matches!(
        set.role_of(user),
        Some(Role::Admin | Role::ProjectManager)
    )
}

/// Creator or current assignee, whatever their project role.
pub fn can_change_task_status(task: &Task, user: Uuid) -> bool {
    user == task.created_by || task.assignee == Some(user)
}

pub fn can_view_task(set: &MembershipSet, task: &Task, user: Uuid) -> bool {
    can_view_project(set, user) || can_change_task_status(task, user)
}

/// Any member may delete a task, including plain members who cannot edit it.
pub fn can_delete_task(set: &MembershipSet, user: Uuid) -> bool {
    set.role_of(user).is_some()
}

/// Create or list comments on a task. Project role is irrelevant here.
pub fn can_access_comment(task: &Task, user: Uuid) -> bool {
    task.assignee == Some(user) || user == task.created_by
}

pub fn can_delete_comment(comment: &Comment, task: &Task, user: Uuid) -> bool {
    user == comment.author || task.assignee == Some(user) || user == task.created_by
}
