use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{advance, storage, Service};
use crate::contract::model::{NewProject, Project, ProjectMember, ProjectPatch};
use crate::domain::access::{can_delete_project, can_mutate_project, can_view_project};
use crate::domain::error::DomainError;
use crate::domain::events::ProjectDomainEvent;
use crate::domain::membership::MembershipSet;

impl Service {
    #[instrument(
        name = "projects.service.create_project",
        skip(self, new_project),
        fields(actor = %actor)
    )]
    pub async fn create_project(
        &self,
        actor: Uuid,
        new_project: NewProject,
    ) -> Result<Project, DomainError> {
        info!("Creating project");

        let title = self.clean_title(&new_project.title)?;
        let description = self.clean_description(new_project.description.as_deref())?;

        let mut set = MembershipSet::with_admin(actor);
        if let Some(proposed) = &new_project.members {
            set = set.set_members(proposed, self.directory.as_ref()).await?;
        }

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            title,
            description,
            owner: actor,
            members: set.into_members(),
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_project(&project).await.map_err(storage)?;

        self.events.publish(&ProjectDomainEvent::ProjectCreated {
            id: project.id,
            by: actor,
            at: now,
        });
        info!(project_id = %project.id, "Project created");
        Ok(project)
    }

    #[instrument(name = "projects.service.list_projects", skip(self), fields(actor = %actor))]
    pub async fn list_projects(&self, actor: Uuid) -> Result<Vec<Project>, DomainError> {
        let projects = self
            .repo
            .list_projects_for_user(actor)
            .await
            .map_err(storage)?;
        debug!(count = projects.len(), "Listed projects");
        Ok(projects)
    }

    #[instrument(
        name = "projects.service.get_project",
        skip(self),
        fields(actor = %actor, project_id = %id)
    )]
    pub async fn get_project(&self, actor: Uuid, id: Uuid) -> Result<Project, DomainError> {
        let (project, set) = self.load_project(id).await?;
        if !can_view_project(&set, actor) {
            return Err(DomainError::forbidden("You are not a member of this project"));
        }
        Ok(project)
    }

    /// Memberships joined with directory profiles, in membership order.
    #[instrument(
        name = "projects.service.list_project_members",
        skip(self),
        fields(actor = %actor, project_id = %id)
    )]
    pub async fn list_project_members(
        &self,
        actor: Uuid,
        id: Uuid,
    ) -> Result<Vec<ProjectMember>, DomainError> {
        let (_, set) = self.load_project(id).await?;
        if !can_view_project(&set, actor) {
            return Err(DomainError::forbidden("You are not a member of this project"));
        }

        let mut profiles: HashMap<Uuid, _> = self
            .directory
            .find_many_by_ids(&set.user_ids())
            .await
            .map_err(storage)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(set
            .into_members()
            .into_iter()
            .map(|membership| ProjectMember {
                profile: profiles.remove(&membership.user),
                membership,
            })
            .collect())
    }

    #[instrument(
        name = "projects.service.update_project",
        skip(self, patch),
        fields(actor = %actor, project_id = %id)
    )]
    pub async fn update_project(
        &self,
        actor: Uuid,
        id: Uuid,
        patch: ProjectPatch,
    ) -> Result<Project, DomainError> {
        info!("Updating project");

        let (mut project, set) = self.load_project(id).await?;
        if !can_mutate_project(&set, actor) {
            return Err(DomainError::forbidden(
                "Only the project admin can update the project",
            ));
        }

        if let Some(title) = &patch.title {
            project.title = self.clean_title(title)?;
        }
        if let Some(description) = &patch.description {
            project.description = self.clean_description(Some(description))?;
        }
        if let Some(proposed) = &patch.members {
            let next = set.set_members(proposed, self.directory.as_ref()).await?;
            project.members = next.into_members();
        }
        project.updated_at = advance(project.updated_at);

        self.repo.update_project(&project).await.map_err(storage)?;

        self.events.publish(&ProjectDomainEvent::ProjectUpdated {
            id: project.id,
            by: actor,
            at: project.updated_at,
        });
        info!("Project updated");
        Ok(project)
    }

    #[instrument(
        name = "projects.service.delete_project",
        skip(self),
        fields(actor = %actor, project_id = %id)
    )]
    pub async fn delete_project(&self, actor: Uuid, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting project");

        let (project, set) = self.load_project(id).await?;
        if !can_delete_project(&set, project.owner, actor) {
            return Err(DomainError::forbidden(
                "Only the project owner can delete the project",
            ));
        }

        if !self.repo.delete_project(id).await.map_err(storage)? {
            return Err(DomainError::project_not_found(id));
        }

        self.events.publish(&ProjectDomainEvent::ProjectDeleted {
            id,
            by: actor,
            at: Utc::now(),
        });
        info!("Project deleted");
        Ok(())
    }
}
