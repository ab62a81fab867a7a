use thiserror::Error;
use uuid::Uuid;

use crate::domain::membership::MembershipSet;
use crate::domain::ports::UserDirectory;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssigneeError {
    #[error("Assignee {user} does not exist")]
    NotFound { user: Uuid },

    #[error("Assignee {user} is not a member of the project")]
    NotMember { user: Uuid },

    #[error("User directory unavailable: {message}")]
    Directory { message: String },
}

/// Check that `candidate` resolves in the directory and belongs to `members`.
/// Runs on every write that sets an assignee. Removing a member later does not
/// touch tasks already assigned to them.
pub async fn validate_assignee(
    directory: &dyn UserDirectory,
    members: &MembershipSet,
    candidate: Uuid,
) -> Result<Uuid, AssigneeError> {
    let exists = directory
        .exists_by_id(candidate)
        .await
        .map_err(|e| AssigneeError::Directory {
            message: e.to_string(),
        })?;
    if !exists {
        return Err(AssigneeError::NotFound { user: candidate });
    }
    if !members.contains(candidate) {
        return Err(AssigneeError::NotMember { user: candidate });
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{Role, UserSummary};
    use async_trait::async_trait;

    struct Directory(Vec<Uuid>);

    #[async_trait]
    impl UserDirectory for Directory {
        async fn find_by_id(&self, _id: Uuid) -> anyhow::Result<Option<UserSummary>> {
            Ok(None)
        }

        async fn find_many_by_ids(&self, _ids: &[Uuid]) -> anyhow::Result<Vec<UserSummary>> {
            Ok(Vec::new())
        }

        async fn exists_by_id(&self, id: Uuid) -> anyhow::Result<bool> {
            Ok(self.0.contains(&id))
        }
    }

    #[tokio::test]
    async fn member_is_accepted() {
        let owner = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut set = MembershipSet::with_admin(owner);
        set.add_member(b, Role::Member).unwrap();

        let dir = Directory(vec![owner, b]);
        assert_eq!(validate_assignee(&dir, &set, b).await, Ok(b));
        assert_eq!(validate_assignee(&dir, &set, owner).await, Ok(owner));
    }

    #[tokio::test]
    async fn existing_non_member_is_rejected() {
        let owner = Uuid::new_v4();
        let d = Uuid::new_v4();
        let dir = Directory(vec![owner, d]);
        let set = MembershipSet::with_admin(owner);

        assert_eq!(
            validate_assignee(&dir, &set, d).await,
            Err(AssigneeError::NotMember { user: d })
        );
    }

    #[tokio::test]
    async fn unknown_user_is_not_found_even_if_listed_as_member() {
        let owner = Uuid::new_v4();
        let ghost = Uuid::new_v4();
        let mut set = MembershipSet::with_admin(owner);
        set.add_member(ghost, Role::Member).unwrap();

        let dir = Directory(vec![owner]);
        assert_eq!(
            validate_assignee(&dir, &set, ghost).await,
            Err(AssigneeError::NotFound { user: ghost })
        );
    }
}
