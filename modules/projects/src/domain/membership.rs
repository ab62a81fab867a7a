//! Per-project mapping of user to role.
//!
//! A set holds exactly one `admin` (the project owner) and no user twice. The only
//! ways to build one are [`MembershipSet::with_admin`] for a new project,
//! [`MembershipSet::restore`] for rows read back from storage, and
//! [`MembershipSet::set_members`] for a client-proposed replacement list.

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::{Membership, ProposedMember, Role};
use crate::domain::ports::UserDirectory;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    #[error("Invalid role '{role}'")]
    InvalidRole { role: String },

    #[error("User {user} is already a member")]
    DuplicateMember { user: Uuid },

    #[error("Project already has an admin; {user} cannot become admin")]
    AdminConflict { user: Uuid },

    #[error("Unknown users: {}", format_ids(.users))]
    UnknownMember { users: Vec<Uuid> },

    #[error("User directory unavailable: {message}")]
    Directory { message: String },
}

fn format_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a wire role value; anything outside the enumerated set is rejected.
pub fn parse_role(raw: &str) -> Result<Role, MembershipError> {
    Role::parse(raw.trim()).ok_or_else(|| MembershipError::InvalidRole {
        role: raw.to_owned(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSet {
    members: Vec<Membership>,
}

impl MembershipSet {
    /// Fresh set for a new project: the owner as sole admin.
    pub fn with_admin(owner: Uuid) -> Self {
        Self {
            members: vec![Membership::new(owner, Role::Admin)],
        }
    }

    /// Wrap memberships loaded from storage.
    pub fn restore(members: Vec<Membership>) -> Self {
        Self { members }
    }

    pub fn add_member(&mut self, user: Uuid, role: Role) -> Result<(), MembershipError> {
        if self.contains(user) {
            return Err(MembershipError::DuplicateMember { user });
        }
        if role == Role::Admin && self.admin().is_some() {
            return Err(MembershipError::AdminConflict { user });
        }
        self.members.push(Membership::new(user, role));
        Ok(())
    }

    /// Replacement list for an update. Every proposed user must exist in the
    /// directory (one batched lookup). Admin entries and any entry for the current
    /// admin are dropped and the current admin is re-inserted first, so the
    /// admin can never be replaced or demoted through this path.
    pub async fn set_members(
        &self,
        proposed: &[ProposedMember],
        directory: &dyn UserDirectory,
    ) -> Result<MembershipSet, MembershipError> {
        let roles = proposed
            .iter()
            .map(|p| parse_role(&p.role))
            .collect::<Result<Vec<_>, _>>()?;

        let requested: BTreeSet<Uuid> = proposed.iter().map(|p| p.user).collect();
        if !requested.is_empty() {
            let ids: Vec<Uuid> = requested.iter().copied().collect();
            let found: HashSet<Uuid> = directory
                .find_many_by_ids(&ids)
                .await
                .map_err(|e| MembershipError::Directory {
                    message: e.to_string(),
                })?
                .into_iter()
                .map(|u| u.id)
                .collect();
            let missing: Vec<Uuid> = ids.into_iter().filter(|id| !found.contains(id)).collect();
            if !missing.is_empty() {
                return Err(MembershipError::UnknownMember { users: missing });
            }
        }

        let mut next = match self.admin() {
            Some(admin) => MembershipSet::with_admin(admin),
            None => MembershipSet::restore(Vec::new()),
        };
        for (p, role) in proposed.iter().zip(roles) {
            if role == Role::Admin || Some(p.user) == self.admin() {
                continue;
            }
            next.add_member(p.user, role)?;
        }
        Ok(next)
    }

    pub fn role_of(&self, user: Uuid) -> Option<Role> {
        self.members
            .iter()
            .find(|m| m.user == user)
            .map(|m| m.role)
    }

    pub fn admin(&self) -> Option<Uuid> {
        self.members
            .iter()
            .find(|m| m.role == Role::Admin)
            .map(|m| m.user)
    }

    pub fn contains(&self, user: Uuid) -> bool {
        self.role_of(user).is_some()
    }

    pub fn members(&self) -> &[Membership] {
        &self.members
    }

    pub fn into_members(self) -> Vec<Membership> {
        self.members
    }

    pub fn user_ids(&self) -> Vec<Uuid> {
        self.members.iter().map(|m| m.user).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::UserSummary;
    use async_trait::async_trait;

    struct KnownUsers(Vec<Uuid>);

    #[async_trait]
    impl UserDirectory for KnownUsers {
        async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserSummary>> {
            Ok(self.0.contains(&id).then(|| summary(id)))
        }

        async fn find_many_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<UserSummary>> {
            Ok(ids
                .iter()
                .filter(|id| self.0.contains(id))
                .map(|id| summary(*id))
                .collect())
        }

        async fn exists_by_id(&self, id: Uuid) -> anyhow::Result<bool> {
            Ok(self.0.contains(&id))
        }
    }

    struct BrokenDirectory;

    #[async_trait]
    impl UserDirectory for BrokenDirectory {
        async fn find_by_id(&self, _id: Uuid) -> anyhow::Result<Option<UserSummary>> {
            anyhow::bail!("connection refused")
        }

        async fn find_many_by_ids(&self, _ids: &[Uuid]) -> anyhow::Result<Vec<UserSummary>> {
            anyhow::bail!("connection refused")
        }

        async fn exists_by_id(&self, _id: Uuid) -> anyhow::Result<bool> {
            anyhow::bail!("connection refused")
        }
    }

    fn summary(id: Uuid) -> UserSummary {
        UserSummary {
            id,
            email: format!("{id}@example.com"),
            full_name: "Someone".into(),
            profile_pic: String::new(),
        }
    }

    fn proposed(user: Uuid, role: &str) -> ProposedMember {
        ProposedMember {
            user,
            role: role.into(),
        }
    }

    fn admins(set: &MembershipSet) -> Vec<Uuid> {
        set.members()
            .iter()
            .filter(|m| m.role == Role::Admin)
            .map(|m| m.user)
            .collect()
    }

    #[test]
    fn with_admin_has_single_admin() {
        let owner = Uuid::new_v4();
        let set = MembershipSet::with_admin(owner);
        assert_eq!(set.admin(), Some(owner));
        assert_eq!(set.role_of(owner), Some(Role::Admin));
        assert_eq!(set.members().len(), 1);
    }

    #[test]
    fn add_member_rejects_duplicates_and_second_admin() {
        let owner = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut set = MembershipSet::with_admin(owner);

        set.add_member(b, Role::Member).unwrap();
        assert_eq!(set.role_of(b), Some(Role::Member));

        assert_eq!(
            set.add_member(b, Role::ProjectManager),
            Err(MembershipError::DuplicateMember { user: b })
        );

        let c = Uuid::new_v4();
        assert_eq!(
            set.add_member(c, Role::Admin),
            Err(MembershipError::AdminConflict { user: c })
        );
        assert_eq!(admins(&set), vec![owner]);
    }

    #[test]
    fn role_of_unknown_user_is_none() {
        let set = MembershipSet::with_admin(Uuid::new_v4());
        assert_eq!(set.role_of(Uuid::new_v4()), None);
    }

    #[test]
    fn parse_role_rejects_values_outside_the_set() {
        assert_eq!(parse_role("member"), Ok(Role::Member));
        assert_eq!(
            parse_role("superuser"),
            Err(MembershipError::InvalidRole {
                role: "superuser".into()
            })
        );
    }

    #[tokio::test]
    async fn set_members_never_replaces_existing_admin() {
        let owner = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let dir = KnownUsers(vec![owner, b, c]);
        let set = MembershipSet::with_admin(owner);

        let next = set
            .set_members(
                &[
                    proposed(b, "admin"),
                    proposed(owner, "member"),
                    proposed(c, "project_manager"),
                ],
                &dir,
            )
            .await
            .unwrap();

        assert_eq!(admins(&next), vec![owner]);
        assert_eq!(next.role_of(owner), Some(Role::Admin));
        assert_eq!(next.role_of(b), None);
        assert_eq!(next.role_of(c), Some(Role::ProjectManager));
        assert_eq!(next.members()[0].user, owner);
    }

    #[tokio::test]
    async fn set_members_reports_every_unknown_user() {
        let owner = Uuid::new_v4();
        let known = Uuid::new_v4();
        let ghost1 = Uuid::new_v4();
        let ghost2 = Uuid::new_v4();
        let dir = KnownUsers(vec![owner, known]);

        let err = MembershipSet::with_admin(owner)
            .set_members(
                &[
                    proposed(known, "member"),
                    proposed(ghost1, "member"),
                    proposed(ghost2, "member"),
                ],
                &dir,
            )
            .await
            .unwrap_err();

        let MembershipError::UnknownMember { users } = err else {
            panic!("expected UnknownMember, got {err:?}");
        };
        let mut expected = vec![ghost1, ghost2];
        expected.sort();
        assert_eq!(users, expected);
    }

    #[tokio::test]
    async fn set_members_rejects_duplicates_and_bad_roles() {
        let owner = Uuid::new_v4();
        let b = Uuid::new_v4();
        let dir = KnownUsers(vec![owner, b]);
        let set = MembershipSet::with_admin(owner);

        let dup = set
            .set_members(&[proposed(b, "member"), proposed(b, "project_manager")], &dir)
            .await;
        assert_eq!(dup, Err(MembershipError::DuplicateMember { user: b }));

        let bad = set.set_members(&[proposed(b, "owner")], &dir).await;
        assert_eq!(
            bad,
            Err(MembershipError::InvalidRole {
                role: "owner".into()
            })
        );
    }

    #[tokio::test]
    async fn empty_proposal_leaves_only_admin() {
        let owner = Uuid::new_v4();
        let mut set = MembershipSet::with_admin(owner);
        set.add_member(Uuid::new_v4(), Role::Member).unwrap();

        let next = set.set_members(&[], &BrokenDirectory).await.unwrap();
        assert_eq!(next, MembershipSet::with_admin(owner));
    }

    #[tokio::test]
    async fn directory_failure_is_surfaced() {
        let owner = Uuid::new_v4();
        let err = MembershipSet::with_admin(owner)
            .set_members(&[proposed(Uuid::new_v4(), "member")], &BrokenDirectory)
            .await
            .unwrap_err();
        assert!(matches!(err, MembershipError::Directory { .. }));
    }
}
